use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Account address as rendered by the upstream node.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(pub String);

impl Address {
    /// Wrap a rendered address.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Address as rendered upstream.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// New state of a single account after a round is applied.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDelta {
    pub balance: u64,
    pub rewards: u64,
    pub closed: bool,
}

/// State changes produced by applying one round's transactions.
///
/// The genesis round carries no delta by convention; the empty value
/// (`LedgerStateDelta::default()`) stands in for it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStateDelta {
    pub accounts: BTreeMap<Address, AccountDelta>,
    pub created_assets: u64,
    pub total_rewards: u64,
}

impl LedgerStateDelta {
    /// True for the empty delta genesis carries.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty() && self.created_assets == 0 && self.total_rewards == 0
    }

    /// Record the resulting state of `address`, replacing any earlier entry.
    pub fn set_account(&mut self, address: Address, delta: AccountDelta) {
        self.accounts.insert(address, delta);
    }

    /// Resulting state of `address`, if it changed.
    pub fn account(&self, address: &Address) -> Option<&AccountDelta> {
        self.accounts.get(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        assert!(LedgerStateDelta::default().is_empty());
    }

    #[test]
    fn set_account_replaces() {
        let mut delta = LedgerStateDelta::default();
        let addr = Address::new("ALICE");
        delta.set_account(addr.clone(), AccountDelta { balance: 1, ..Default::default() });
        delta.set_account(addr.clone(), AccountDelta { balance: 7, ..Default::default() });
        assert_eq!(delta.accounts.len(), 1);
        assert_eq!(delta.account(&addr).unwrap().balance, 7);
        assert!(!delta.is_empty());
    }

    #[test]
    fn rewards_alone_make_delta_non_empty() {
        let delta = LedgerStateDelta {
            total_rewards: 5,
            ..Default::default()
        };
        assert!(!delta.is_empty());
    }
}
