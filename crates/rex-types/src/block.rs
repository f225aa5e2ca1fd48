use serde::{Deserialize, Serialize};

use crate::delta::{Address, LedgerStateDelta};
use crate::digest::Digest;
use crate::round::Round;

/// A signed transaction as it appears in a block's payset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTxn {
    pub sender: Address,
    pub receiver: Address,
    pub amount: u64,
    pub fee: u64,
    #[serde(default)]
    pub note: Vec<u8>,
}

impl SignedTxn {
    /// Transaction id.
    pub fn id(&self) -> Digest {
        Digest::tagged(
            "rex/txn",
            &[
                self.sender.as_str().as_bytes(),
                self.receiver.as_str().as_bytes(),
                &self.amount.to_le_bytes(),
                &self.fee.to_le_bytes(),
                &self.note,
            ],
        )
    }
}

/// Block header for a single round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub round: Round,
    pub prev_hash: Digest,
    pub genesis_hash: Digest,
    pub timestamp: i64,
    pub txn_commitment: Digest,
}

impl BlockHeader {
    /// Header hash, chained into the next header's `prev_hash`.
    pub fn hash(&self) -> Digest {
        Digest::tagged(
            "rex/header",
            &[
                &self.round.to_le_bytes(),
                self.prev_hash.as_bytes(),
                self.genesis_hash.as_bytes(),
                &self.timestamp.to_le_bytes(),
                self.txn_commitment.as_bytes(),
            ],
        )
    }
}

/// Commitment over an ordered payset.
pub fn payset_commitment(payset: &[SignedTxn]) -> Digest {
    let ids: Vec<Digest> = payset.iter().map(SignedTxn::id).collect();
    let refs: Vec<&[u8]> = ids.iter().map(|d| d.as_bytes().as_slice()).collect();
    Digest::tagged("rex/payset", &refs)
}

/// Header plus payset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub payset: Vec<SignedTxn>,
}

impl Block {
    /// Round this header belongs to.
    pub fn round(&self) -> Round {
        self.header.round
    }
}

/// One round of block data as delivered by the upstream pipeline.
///
/// `delta` is required for every round except round 0.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockUnit {
    pub header: BlockHeader,
    pub payset: Vec<SignedTxn>,
    pub delta: Option<LedgerStateDelta>,
}

impl BlockUnit {
    /// Build a unit chained onto `prev_hash`, computing the payset commitment.
    pub fn new(
        round: Round,
        prev_hash: Digest,
        genesis_hash: Digest,
        payset: Vec<SignedTxn>,
        delta: Option<LedgerStateDelta>,
    ) -> Self {
        let header = BlockHeader {
            round,
            prev_hash,
            genesis_hash,
            timestamp: 0,
            txn_commitment: payset_commitment(&payset),
        };
        Self {
            header,
            payset,
            delta,
        }
    }

    /// Round of the wrapped header.
    pub fn round(&self) -> Round {
        self.header.round
    }
}

/// A block together with the delta it produced. This is the unit handed to
/// the storage engine; it is built fresh for every write and not retained.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedBlock {
    pub block: Block,
    pub delta: LedgerStateDelta,
}

impl ValidatedBlock {
    /// Pair a block with the delta it produced.
    pub fn new(header: BlockHeader, payset: Vec<SignedTxn>, delta: LedgerStateDelta) -> Self {
        Self {
            block: Block { header, payset },
            delta,
        }
    }

    /// Round of the stored block.
    pub fn round(&self) -> Round {
        self.block.round()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn txn(amount: u64) -> SignedTxn {
        SignedTxn {
            sender: Address::new("S"),
            receiver: Address::new("R"),
            amount,
            fee: 1000,
            note: Vec::new(),
        }
    }

    #[test]
    fn unit_commits_to_payset() {
        let unit = BlockUnit::new(3, Digest::zero(), Digest::zero(), vec![txn(1), txn(2)], None);
        assert_eq!(unit.round(), 3);
        assert_eq!(unit.header.txn_commitment, payset_commitment(&unit.payset));
    }

    #[test]
    fn payset_order_changes_commitment() {
        let a = payset_commitment(&[txn(1), txn(2)]);
        let b = payset_commitment(&[txn(2), txn(1)]);
        assert_ne!(a, b);
    }

    #[test]
    fn header_hash_covers_round() {
        let a = BlockUnit::new(1, Digest::zero(), Digest::zero(), vec![], None);
        let b = BlockUnit::new(2, Digest::zero(), Digest::zero(), vec![], None);
        assert_ne!(a.header.hash(), b.header.hash());
    }

    #[test]
    fn validated_block_keeps_round() {
        let unit = BlockUnit::new(9, Digest::zero(), Digest::zero(), vec![txn(5)], None);
        let vb = ValidatedBlock::new(unit.header.clone(), unit.payset.clone(), LedgerStateDelta::default());
        assert_eq!(vb.round(), 9);
        assert_eq!(vb.block.payset.len(), 1);
    }

    proptest! {
        #[test]
        fn txn_ids_distinguish_amounts(a in any::<u64>(), b in any::<u64>()) {
            prop_assume!(a != b);
            prop_assert_ne!(txn(a).id(), txn(b).id());
        }
    }
}
