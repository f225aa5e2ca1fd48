use rex_store::StoreError;
use rex_types::Round;

use crate::exporter::LifecycleState;

/// Errors surfaced by the exporter to its host.
///
/// Every initialization error is fatal: the exporter never reaches the
/// ready state. Ingestion errors are returned to the caller with the round
/// counter untouched; the exporter does not retry.
#[derive(Debug, thiserror::Error)]
pub enum ExporterError {
    /// Invalid or unreadable configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The storage engine could not be opened or never became ready.
    #[error("connect failure on {backend}: {source}")]
    Connection { backend: String, source: StoreError },

    /// Genesis could not be imported.
    #[error("error importing genesis: {0}")]
    Bootstrap(StoreError),

    /// The storage engine could not report its next round.
    #[error("error getting next db round: {0}")]
    RoundQuery(StoreError),

    /// Upstream and storage disagree on where ingestion resumes.
    #[error("initializing block round {upstream} but next round to account is {storage}")]
    RoundMismatch { upstream: Round, storage: Round },

    /// A non-genesis block arrived without its ledger state delta.
    #[error("ledger state delta is missing from block {round}, ensure the upstream importer computes deltas")]
    MissingDelta { round: Round },

    /// The block is at the last representable round; its successor cannot
    /// be tracked.
    #[error("block {round} is the last representable round")]
    RoundOverflow { round: Round },

    /// The storage engine rejected a write. Carries the engine error as is.
    #[error(transparent)]
    Persist(StoreError),

    /// The operation is not valid in the current lifecycle state.
    #[error("cannot {operation} while exporter is {state}")]
    InvalidState {
        state: LifecycleState,
        operation: &'static str,
    },

    /// Plugin lookup or registration failed.
    #[error("registry error: {0}")]
    Registry(String),
}

impl ExporterError {
    pub(crate) fn connection(backend: &str, source: StoreError) -> Self {
        Self::Connection {
            backend: backend.to_owned(),
            source,
        }
    }
}

/// Result alias for exporter operations.
pub type ExporterResult<T> = Result<T, ExporterError>;
