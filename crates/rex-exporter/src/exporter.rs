use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use rex_prune::{
    CancelToken, PruneContext, PruningTask, RetentionPruner, ShutdownBarrier,
};
use rex_store::{ensure_initial_import, InMemoryStorageEngine, StorageEngine, StorageHandle};
use rex_types::{BlockUnit, LedgerStateDelta, Round, SharedRound, ValidatedBlock};

use crate::config::ExporterConfig;
use crate::error::{ExporterError, ExporterResult};
use crate::plugin::{Exporter, InitProvider, Metadata, PluginConfig};

/// Name the exporter is registered under.
pub const PLUGIN_NAME: &str = "indexer";

const SAMPLE_CONFIG: &str = include_str!("sample.toml");

/// Lifecycle of an [`IndexerExporter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Initializing,
    Ready,
    /// Initialization failed. Terminal until `close`.
    Failed,
    Closed,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Failed => "failed",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Exporter that writes validated blocks into a storage engine.
///
/// Owns the storage handle, the live round counter, and the retention task.
/// The round counter has a single writer (`receive`) and is read by the
/// retention task through [`SharedRound`], so no lock guards it.
pub struct IndexerExporter {
    backend: Arc<dyn StorageEngine>,
    pruner: Arc<dyn PruningTask>,
    cfg: ExporterConfig,
    state: LifecycleState,
    round: SharedRound,
    handle: Option<Arc<dyn StorageHandle>>,
    cancel: Option<CancelToken>,
    barrier: ShutdownBarrier,
}

impl IndexerExporter {
    /// Exporter writing to `backend` outside test mode, pruning with
    /// [`RetentionPruner`].
    pub fn new(backend: Arc<dyn StorageEngine>) -> Self {
        Self::with_pruner(backend, Arc::new(RetentionPruner))
    }

    /// Exporter with a caller-supplied retention task.
    pub fn with_pruner(backend: Arc<dyn StorageEngine>, pruner: Arc<dyn PruningTask>) -> Self {
        Self {
            backend,
            pruner,
            cfg: ExporterConfig::default(),
            state: LifecycleState::Uninitialized,
            round: SharedRound::default(),
            handle: None,
            cancel: None,
            barrier: ShutdownBarrier::new(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Next round the exporter expects to receive.
    pub fn round(&self) -> Round {
        self.round.load()
    }

    /// Live view of the round counter, for status reporting.
    pub fn shared_round(&self) -> SharedRound {
        self.round.clone()
    }

    /// Whether a retention task was started and not yet cancelled.
    pub fn is_pruning(&self) -> bool {
        self.cancel.is_some()
    }

    /// Configuration accepted by the last successful `init`.
    pub fn exporter_config(&self) -> &ExporterConfig {
        &self.cfg
    }

    async fn initialize(
        &mut self,
        provider: &dyn InitProvider,
        config: PluginConfig,
    ) -> ExporterResult<()> {
        let cfg: ExporterConfig = config.unmarshal()?;
        cfg.validate()?;
        self.cfg = cfg;

        let engine: Arc<dyn StorageEngine> = if self.cfg.test {
            Arc::new(InMemoryStorageEngine::new())
        } else {
            Arc::clone(&self.backend)
        };
        let backend = engine.name().to_owned();

        let (handle, ready) = engine
            .open(&self.cfg.connection_params())
            .await
            .map_err(|e| ExporterError::connection(&backend, e))?;
        // Kept even if a later step fails so that `close` can release it.
        self.handle = Some(Arc::clone(&handle));
        ready
            .wait()
            .await
            .map_err(|e| ExporterError::connection(&backend, e))?;

        let imported = ensure_initial_import(handle.as_ref(), provider.genesis())
            .await
            .map_err(ExporterError::Bootstrap)?;

        let storage = handle
            .next_round_to_accept()
            .await
            .map_err(ExporterError::RoundQuery)?;
        let upstream = provider.next_db_round();
        if upstream != storage {
            return Err(ExporterError::RoundMismatch { upstream, storage });
        }
        self.round.publish(storage);

        if self.cfg.pruning_enabled() {
            self.start_pruning(handle);
        }

        info!(
            backend = %backend,
            round = storage,
            genesis_imported = imported,
            pruning = self.is_pruning(),
            "exporter initialized"
        );
        Ok(())
    }

    fn start_pruning(&mut self, handle: Arc<dyn StorageHandle>) {
        let token = CancelToken::new();
        let ctx = PruneContext {
            cancel: token.signal(),
            round: self.round.clone(),
            handle,
            policy: self.cfg.delete_task.clone(),
        };
        self.pruner.start(ctx, &mut self.barrier);
        self.cancel = Some(token);
    }
}

#[async_trait]
impl Exporter for IndexerExporter {
    fn metadata(&self) -> Metadata {
        Metadata {
            name: PLUGIN_NAME,
            description: "Exporter for writing validated blocks to an indexer storage engine.",
            deprecated: false,
            sample_config: SAMPLE_CONFIG,
        }
    }

    async fn init(
        &mut self,
        provider: &dyn InitProvider,
        config: PluginConfig,
    ) -> ExporterResult<()> {
        if self.state != LifecycleState::Uninitialized {
            return Err(ExporterError::InvalidState {
                state: self.state,
                operation: "initialize",
            });
        }
        self.state = LifecycleState::Initializing;

        match self.initialize(provider, config).await {
            Ok(()) => {
                self.state = LifecycleState::Ready;
                Ok(())
            }
            Err(e) => {
                self.state = LifecycleState::Failed;
                error!(error = %e, "exporter initialization failed");
                Err(e)
            }
        }
    }

    fn config(&self) -> String {
        match self.cfg.to_toml() {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "failed to render exporter config");
                String::new()
            }
        }
    }

    async fn receive(&mut self, unit: BlockUnit) -> ExporterResult<()> {
        let handle = match (&self.state, &self.handle) {
            (LifecycleState::Ready, Some(handle)) => handle,
            _ => {
                return Err(ExporterError::InvalidState {
                    state: self.state,
                    operation: "receive",
                })
            }
        };

        let round = unit.round();
        let delta = match unit.delta {
            Some(delta) => delta,
            // Genesis carries no delta by convention.
            None if round == 0 => LedgerStateDelta::default(),
            None => return Err(ExporterError::MissingDelta { round }),
        };
        let next = round
            .checked_add(1)
            .ok_or(ExporterError::RoundOverflow { round })?;

        let block = ValidatedBlock::new(unit.header, unit.payset, delta);
        handle
            .add_block(&block)
            .await
            .map_err(ExporterError::Persist)?;

        self.round.publish(next);
        debug!(round, txns = block.block.payset.len(), "block exported");
        Ok(())
    }

    async fn close(&mut self) -> ExporterResult<()> {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
        // The retention task holds the handle; it must be gone before we
        // release it.
        if !self.barrier.is_empty() {
            let joined = self.barrier.wait().await;
            debug!(joined, "retention task stopped");
        }
        if let Some(handle) = self.handle.take() {
            handle.close();
            info!(round = self.round.load(), "storage handle released");
        }
        self.state = LifecycleState::Closed;
        Ok(())
    }
}
