use std::time::Duration;

use serde::{Deserialize, Serialize};

use rex_types::Round;

/// Retention window and pass frequency for the delete task.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RetentionPolicy {
    /// Number of most recent rounds to keep. `0` disables pruning.
    pub rounds: u64,
    /// Minimum number of rounds ingested between two delete passes.
    /// `0` runs a pass on every wake-up.
    pub interval: u64,
    /// How often the task wakes up to look at the round counter.
    pub poll_ms: u64,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            rounds: 0,
            interval: 0,
            poll_ms: 1_000,
        }
    }
}

impl RetentionPolicy {
    /// Keep the last `rounds` rounds, other settings default.
    pub fn keep_last(rounds: u64) -> Self {
        Self {
            rounds,
            ..Default::default()
        }
    }

    /// A zero window disables pruning.
    pub fn is_enabled(&self) -> bool {
        self.rounds > 0
    }

    /// Wake period, at least one millisecond.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms.max(1))
    }

    /// First round to keep when `next_round` is the next round to accept,
    /// or `None` if nothing is old enough to delete.
    pub fn keep_from(&self, next_round: Round) -> Option<Round> {
        if !self.is_enabled() || next_round <= self.rounds {
            return None;
        }
        Some(next_round - self.rounds)
    }

    /// Whether enough rounds have passed since the last delete pass.
    pub fn is_due(&self, next_round: Round, last_pass: Option<Round>) -> bool {
        match last_pass {
            None => true,
            Some(last) => next_round.saturating_sub(last) >= self.interval.max(1),
        }
    }
}
