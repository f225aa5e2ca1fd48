use std::fmt;

use serde::{Deserialize, Serialize};

/// 32-byte BLAKE3 digest identifying a block, a payset, or a genesis.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Digest([u8; 32]);

impl Digest {
    /// Hash a sequence of parts under a domain tag, so that digests of
    /// different record kinds never collide. Each part is length-prefixed.
    pub fn tagged(tag: &str, parts: &[&[u8]]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(tag.as_bytes());
        for part in parts {
            hasher.update(&(part.len() as u64).to_le_bytes());
            hasher.update(part);
        }
        Self(*hasher.finalize().as_bytes())
    }

    /// All-zero digest, used as the parent of the first block.
    pub const fn zero() -> Self {
        Self([0u8; 32])
    }

    /// The raw 32 bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Full lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 8 hex characters, for log lines.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.short_hex())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagging_is_deterministic() {
        assert_eq!(Digest::tagged("t", &[b"round"]), Digest::tagged("t", &[b"round"]));
        assert_ne!(Digest::tagged("t", &[b"round"]), Digest::tagged("t", &[b"other"]));
    }

    #[test]
    fn tags_separate_domains() {
        let a = Digest::tagged("block", &[b"x"]);
        let b = Digest::tagged("genesis", &[b"x"]);
        assert_ne!(a, b);
    }

    #[test]
    fn part_boundaries_matter() {
        let a = Digest::tagged("t", &[b"ab", b"c"]);
        let b = Digest::tagged("t", &[b"a", b"bc"]);
        assert_ne!(a, b);
    }

    #[test]
    fn renders_hex() {
        let d = Digest::tagged("t", &[b"x"]);
        assert_eq!(format!("{d}"), d.to_hex());
        assert_eq!(d.to_hex().len(), 64);
        assert_eq!(d.short_hex(), &d.to_hex()[..8]);
        assert_eq!(Digest::zero().to_hex(), "0".repeat(64));
    }
}
