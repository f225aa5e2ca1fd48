use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::debug;

use rex_types::{Digest, GenesisDescriptor, Round, ValidatedBlock};

use crate::error::{StoreError, StoreResult};
use crate::traits::{ConnectionParams, ReadySignal, StorageEngine, StorageHandle};

/// Non-persistent storage engine.
///
/// Used as the backend when the exporter runs in test mode, and as the
/// storage double throughout the test suites. State is shared by every
/// handle the engine opens, so a second open sees what the first one wrote.
/// Failures can be injected with [`fail_opens`](Self::fail_opens),
/// [`fail_ready`](Self::fail_ready) and [`fail_next_adds`](Self::fail_next_adds).
#[derive(Clone, Default)]
pub struct InMemoryStorageEngine {
    state: Arc<RwLock<MemState>>,
}

#[derive(Default)]
struct MemState {
    genesis: Option<Digest>,
    blocks: BTreeMap<Round, ValidatedBlock>,
    next_round: Round,
    genesis_imports: usize,
    opens: usize,
    open_handles: usize,
    fail_opens: bool,
    fail_ready: bool,
    fail_next_adds: usize,
}

impl InMemoryStorageEngine {
    /// Empty engine with no genesis imported.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `open` fail.
    pub fn fail_opens(&self, fail: bool) {
        self.write().fail_opens = fail;
    }

    /// Make every subsequent open report a readiness failure.
    pub fn fail_ready(&self, fail: bool) {
        self.write().fail_ready = fail;
    }

    /// Reject the next `n` calls to `add_block`.
    pub fn fail_next_adds(&self, n: usize) {
        self.write().fail_next_adds = n;
    }

    /// Import `genesis` and accept empty-delta blocks for rounds `0..next_round`,
    /// as if a previous exporter run had already ingested them.
    pub fn seed(&self, genesis: &GenesisDescriptor, next_round: Round) {
        let mut state = self.write();
        state.genesis = Some(genesis.hash());
        for round in 0..next_round {
            let unit = rex_types::BlockUnit::new(round, Digest::zero(), genesis.hash(), vec![], None);
            state.blocks.insert(
                round,
                ValidatedBlock::new(unit.header, unit.payset, Default::default()),
            );
        }
        state.next_round = next_round;
    }

    /// Import `genesis` and resume at `next_round` with no blocks kept, as if
    /// every earlier round had already been pruned.
    pub fn resume_at(&self, genesis: &GenesisDescriptor, next_round: Round) {
        let mut state = self.write();
        state.genesis = Some(genesis.hash());
        state.blocks.clear();
        state.next_round = next_round;
    }

    /// Next round the store accepts, or `None` before genesis is imported.
    pub fn next_round(&self) -> Option<Round> {
        let state = self.read();
        state.genesis.map(|_| state.next_round)
    }

    /// Stored block for `round`, if it has not been pruned.
    pub fn block(&self, round: Round) -> Option<ValidatedBlock> {
        self.read().blocks.get(&round).cloned()
    }

    /// Number of blocks currently stored.
    pub fn block_count(&self) -> usize {
        self.read().blocks.len()
    }

    /// Lowest round still stored.
    pub fn oldest_round(&self) -> Option<Round> {
        self.read().blocks.keys().next().copied()
    }

    /// Times genesis was actually written, not counting idempotent repeats.
    pub fn genesis_imports(&self) -> usize {
        self.read().genesis_imports
    }

    /// Number of `open` calls made, successful or not.
    pub fn opens(&self) -> usize {
        self.read().opens
    }

    /// Handles opened and not yet closed.
    pub fn open_handles(&self) -> usize {
        self.read().open_handles
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, MemState> {
        self.state.read().expect("lock poisoned")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, MemState> {
        self.state.write().expect("lock poisoned")
    }
}

impl std::fmt::Debug for InMemoryStorageEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("InMemoryStorageEngine")
            .field("next_round", &state.next_round)
            .field("block_count", &state.blocks.len())
            .field("open_handles", &state.open_handles)
            .finish()
    }
}

#[async_trait]
impl StorageEngine for InMemoryStorageEngine {
    fn name(&self) -> &str {
        "memory"
    }

    async fn open(
        &self,
        params: &ConnectionParams,
    ) -> StoreResult<(Arc<dyn StorageHandle>, ReadySignal)> {
        let fail_ready = {
            let mut state = self.write();
            state.opens += 1;
            if state.fail_opens {
                return Err(StoreError::Connection("connection refused".into()));
            }
            state.open_handles += 1;
            state.fail_ready
        };

        debug!(max_conn = params.max_conn, read_only = params.read_only, "memory store opened");

        let handle = MemHandle {
            state: Arc::clone(&self.state),
            read_only: params.read_only,
            closed: AtomicBool::new(false),
        };
        let signal = if fail_ready {
            let (notifier, signal) = ReadySignal::channel();
            notifier.notify(Err(StoreError::Connection("store never became ready".into())));
            signal
        } else {
            ReadySignal::ready()
        };
        Ok((Arc::new(handle), signal))
    }
}

struct MemHandle {
    state: Arc<RwLock<MemState>>,
    read_only: bool,
    closed: AtomicBool,
}

impl MemHandle {
    fn check_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    fn check_writable(&self) -> StoreResult<()> {
        self.check_open()?;
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        Ok(())
    }

    fn lock(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, MemState>> {
        self.state
            .write()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl StorageHandle for MemHandle {
    async fn next_round_to_accept(&self) -> StoreResult<Round> {
        self.check_open()?;
        let state = self.lock()?;
        match state.genesis {
            Some(_) => Ok(state.next_round),
            None => Err(StoreError::NotInitialized),
        }
    }

    async fn genesis_hash(&self) -> StoreResult<Option<Digest>> {
        self.check_open()?;
        Ok(self.lock()?.genesis)
    }

    async fn load_genesis(&self, genesis: &GenesisDescriptor) -> StoreResult<()> {
        self.check_writable()?;
        let mut state = self.lock()?;
        let incoming = genesis.hash();
        if let Some(stored) = state.genesis {
            if stored != incoming {
                return Err(StoreError::GenesisMismatch { stored, incoming });
            }
            return Ok(());
        }
        state.genesis = Some(incoming);
        state.next_round = 0;
        state.genesis_imports += 1;
        Ok(())
    }

    async fn add_block(&self, block: &ValidatedBlock) -> StoreResult<()> {
        self.check_writable()?;
        let mut state = self.lock()?;
        if state.genesis.is_none() {
            return Err(StoreError::NotInitialized);
        }
        if state.fail_next_adds > 0 {
            state.fail_next_adds -= 1;
            return Err(StoreError::Backend(format!(
                "injected write failure at round {}",
                block.round()
            )));
        }
        if block.round() != state.next_round {
            return Err(StoreError::RoundOutOfOrder {
                expected: state.next_round,
                got: block.round(),
            });
        }
        let next = block.round().checked_add(1).ok_or_else(|| {
            StoreError::Backend(format!("round {} has no successor", block.round()))
        })?;
        state.blocks.insert(block.round(), block.clone());
        state.next_round = next;
        Ok(())
    }

    async fn delete_before(&self, keep_from: Round) -> StoreResult<u64> {
        self.check_writable()?;
        let mut state = self.lock()?;
        let kept = state.blocks.split_off(&keep_from);
        let removed = std::mem::replace(&mut state.blocks, kept);
        Ok(removed.len() as u64)
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            if let Ok(mut state) = self.state.write() {
                state.open_handles = state.open_handles.saturating_sub(1);
            }
        }
    }
}
