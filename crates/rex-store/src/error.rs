use rex_types::{Digest, Round};

/// Errors from storage engine operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Genesis has not been imported yet.
    #[error("storage is not initialized: genesis has not been imported")]
    NotInitialized,

    /// The engine could not be reached or never became ready.
    #[error("connection error: {0}")]
    Connection(String),

    /// A block was offered out of order.
    #[error("adding block round {got} but next round to account is {expected}")]
    RoundOutOfOrder { expected: Round, got: Round },

    /// The store already holds a different genesis.
    #[error("genesis hash mismatch: stored {stored}, incoming {incoming}")]
    GenesisMismatch { stored: Digest, incoming: Digest },

    /// The handle has been closed.
    #[error("storage handle is closed")]
    Closed,

    /// A write was attempted through a read-only handle.
    #[error("storage handle is read-only")]
    ReadOnly,

    /// Any other failure reported by the backend.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
