use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use rex_types::{Digest, GenesisDescriptor, Round, ValidatedBlock};

use crate::error::{StoreError, StoreResult};

/// Parameters used to open a storage engine connection.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParams {
    pub connection_string: String,
    pub max_conn: u32,
    pub read_only: bool,
}

impl fmt::Debug for ConnectionParams {
    // Connection strings routinely embed passwords.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("connection_string", &"<redacted>")
            .field("max_conn", &self.max_conn)
            .field("read_only", &self.read_only)
            .finish()
    }
}

/// Receiving side of an engine's readiness notification.
///
/// An engine may return from [`StorageEngine::open`] before it can serve
/// requests (for example while migrations run). Callers must await
/// [`ReadySignal::wait`] before using the handle.
#[derive(Debug)]
pub struct ReadySignal(oneshot::Receiver<StoreResult<()>>);

/// Sending side of a [`ReadySignal`].
#[derive(Debug)]
pub struct ReadyNotifier(oneshot::Sender<StoreResult<()>>);

impl ReadySignal {
    /// Linked notifier and signal.
    pub fn channel() -> (ReadyNotifier, ReadySignal) {
        let (tx, rx) = oneshot::channel();
        (ReadyNotifier(tx), ReadySignal(rx))
    }

    /// A signal that is already ready.
    pub fn ready() -> Self {
        let (notifier, signal) = Self::channel();
        notifier.notify(Ok(()));
        signal
    }

    /// Block until the engine reports ready or fails.
    pub async fn wait(self) -> StoreResult<()> {
        match self.0.await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Connection(
                "storage engine dropped its ready signal".into(),
            )),
        }
    }
}

impl ReadyNotifier {
    /// Report readiness, or the reason the engine cannot serve.
    pub fn notify(self, result: StoreResult<()>) {
        // The waiter may have given up already.
        let _ = self.0.send(result);
    }
}

/// An open connection to a storage engine.
#[async_trait]
pub trait StorageHandle: Send + Sync {
    /// The round the engine expects to receive next.
    ///
    /// Returns [`StoreError::NotInitialized`] if genesis is missing.
    async fn next_round_to_accept(&self) -> StoreResult<Round>;

    /// Hash of the imported genesis, or `None` before bootstrap.
    async fn genesis_hash(&self) -> StoreResult<Option<Digest>>;

    /// Import baseline state. After this the next round to accept is 0.
    async fn load_genesis(&self, genesis: &GenesisDescriptor) -> StoreResult<()>;

    /// Durably persist one validated block.
    async fn add_block(&self, block: &ValidatedBlock) -> StoreResult<()>;

    /// Delete data for every round strictly below `keep_from`.
    ///
    /// Returns the number of rounds removed.
    async fn delete_before(&self, keep_from: Round) -> StoreResult<u64>;

    /// Release the connection. Further calls fail with [`StoreError::Closed`].
    fn close(&self);
}

/// Factory for [`StorageHandle`]s.
#[async_trait]
pub trait StorageEngine: Send + Sync {
    /// Backend name, used in log lines.
    fn name(&self) -> &str;

    async fn open(
        &self,
        params: &ConnectionParams,
    ) -> StoreResult<(Arc<dyn StorageHandle>, ReadySignal)>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ready_signal_delivers_result() {
        assert!(ReadySignal::ready().wait().await.is_ok());

        let (notifier, signal) = ReadySignal::channel();
        notifier.notify(Err(StoreError::Backend("migration failed".into())));
        assert_eq!(
            signal.wait().await,
            Err(StoreError::Backend("migration failed".into()))
        );
    }

    #[tokio::test]
    async fn dropped_notifier_is_a_connection_error() {
        let (notifier, signal) = ReadySignal::channel();
        drop(notifier);
        assert!(matches!(signal.wait().await, Err(StoreError::Connection(_))));
    }

    #[test]
    fn debug_redacts_connection_string() {
        let params = ConnectionParams {
            connection_string: "password=hunter2".into(),
            max_conn: 4,
            read_only: false,
        };
        let rendered = format!("{params:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("max_conn: 4"));
    }
}
