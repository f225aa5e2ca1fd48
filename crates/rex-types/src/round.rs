use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Sequential block number.
pub type Round = u64;

/// Live "next round to accept" shared between the ingestion path and
/// background readers.
///
/// There is exactly one writer (the ingestion path), so the counter is
/// advanced with a plain release store rather than a read-modify-write.
/// Readers always observe the latest published value, possibly with a
/// short propagation delay.
#[derive(Clone, Debug, Default)]
pub struct SharedRound(Arc<AtomicU64>);

impl SharedRound {
    /// Counter starting at `round`.
    pub fn new(round: Round) -> Self {
        Self(Arc::new(AtomicU64::new(round)))
    }

    /// Latest published round.
    pub fn load(&self) -> Round {
        self.0.load(Ordering::Acquire)
    }

    /// Publish a new value. Only the single writer may call this.
    pub fn publish(&self, round: Round) {
        self.0.store(round, Ordering::Release);
    }

    /// Returns `true` if both handles observe the same counter.
    pub fn ptr_eq(&self, other: &SharedRound) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
