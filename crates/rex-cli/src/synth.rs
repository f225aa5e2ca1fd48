use rex_types::{
    AccountDelta, Address, BlockUnit, Digest, GenesisAllocation, GenesisDescriptor,
    LedgerStateDelta, Round, SignedTxn,
};

const ACCOUNTS: [&str; 3] = ["ALICE", "BOB", "CAROL"];
const INITIAL_BALANCE: u64 = 1_000_000;
const FEE: u64 = 1_000;

/// Genesis for `network`, funding the synthetic accounts.
pub fn genesis(network: &str) -> GenesisDescriptor {
    let allocations = ACCOUNTS
        .iter()
        .map(|name| GenesisAllocation {
            address: Address::new(*name),
            balance: INITIAL_BALANCE,
            comment: String::new(),
        })
        .collect();
    GenesisDescriptor::new(network, allocations)
}

/// Deterministic chain of rounds: round `r` moves `r` units from one
/// account to the next. Round 0 carries no delta.
pub struct SyntheticChain {
    genesis_hash: Digest,
    prev_hash: Digest,
    balances: [u64; 3],
}

impl SyntheticChain {
    /// Chain starting right after `genesis`.
    pub fn new(genesis: &GenesisDescriptor) -> Self {
        Self {
            genesis_hash: genesis.hash(),
            prev_hash: Digest::zero(),
            balances: [INITIAL_BALANCE; 3],
        }
    }

    /// Block unit for `round`. Rounds must be requested in order.
    pub fn next_unit(&mut self, round: Round) -> BlockUnit {
        if round == 0 {
            let unit = BlockUnit::new(0, self.prev_hash, self.genesis_hash, vec![], None);
            self.prev_hash = unit.header.hash();
            return unit;
        }

        let from = (round % 3) as usize;
        let to = (from + 1) % 3;
        let fee = FEE.min(self.balances[from]);
        let amount = round.min(self.balances[from] - fee);
        self.balances[from] -= amount + fee;
        self.balances[to] += amount;

        let txn = SignedTxn {
            sender: Address::new(ACCOUNTS[from]),
            receiver: Address::new(ACCOUNTS[to]),
            amount,
            fee,
            note: Vec::new(),
        };
        let mut delta = LedgerStateDelta::default();
        for idx in [from, to] {
            delta.set_account(
                Address::new(ACCOUNTS[idx]),
                AccountDelta {
                    balance: self.balances[idx],
                    ..Default::default()
                },
            );
        }

        let unit = BlockUnit::new(round, self.prev_hash, self.genesis_hash, vec![txn], Some(delta));
        self.prev_hash = unit.header.hash();
        unit
    }
}
