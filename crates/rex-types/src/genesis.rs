use serde::{Deserialize, Serialize};

use crate::delta::Address;
use crate::digest::Digest;

/// Initial balance of one account at genesis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAllocation {
    pub address: Address,
    pub balance: u64,
    #[serde(default)]
    pub comment: String,
}

/// Baseline network state imported into storage exactly once, before
/// round 0 is ingested.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisDescriptor {
    pub network: String,
    pub allocations: Vec<GenesisAllocation>,
    pub timestamp: i64,
}

impl GenesisDescriptor {
    /// Genesis for `network` with a zero timestamp.
    pub fn new(network: impl Into<String>, allocations: Vec<GenesisAllocation>) -> Self {
        Self {
            network: network.into(),
            allocations,
            timestamp: 0,
        }
    }

    /// Identifying hash of this genesis, stable across processes.
    pub fn hash(&self) -> Digest {
        let mut parts: Vec<Vec<u8>> = vec![self.network.as_bytes().to_vec()];
        parts.push(self.timestamp.to_le_bytes().to_vec());
        for alloc in &self.allocations {
            parts.push(alloc.address.as_str().as_bytes().to_vec());
            parts.push(alloc.balance.to_le_bytes().to_vec());
        }
        let refs: Vec<&[u8]> = parts.iter().map(Vec::as_slice).collect();
        Digest::tagged("rex/genesis", &refs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GenesisDescriptor {
        GenesisDescriptor::new(
            "testnet",
            vec![
                GenesisAllocation {
                    address: Address::new("A"),
                    balance: 100,
                    comment: "faucet".into(),
                },
                GenesisAllocation {
                    address: Address::new("B"),
                    balance: 50,
                    comment: String::new(),
                },
            ],
        )
    }

    #[test]
    fn hash_ignores_comments() {
        let a = sample();
        let mut b = sample();
        b.allocations[0].comment = "renamed".into();
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn hash_depends_on_network() {
        let a = sample();
        let mut b = sample();
        b.network = "mainnet".into();
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn comment_defaults_when_absent() {
        let json = r#"{"network":"n","allocations":[{"address":"A","balance":1}],"timestamp":0}"#;
        let g: GenesisDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(g.allocations[0].comment, "");
    }
}
