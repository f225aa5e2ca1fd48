use std::future::Future;

use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error};

/// Owner side of a one-shot cancellation.
#[derive(Debug)]
pub struct CancelToken {
    tx: watch::Sender<bool>,
}

/// Observer side of a [`CancelToken`]. Cheap to clone.
#[derive(Clone, Debug)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// New, uncancelled token.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// New receiver for this token.
    pub fn signal(&self) -> CancelSignal {
        CancelSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Fire the token. Returns `true` only for the call that fired it.
    pub fn cancel(&self) -> bool {
        self.tx.send_if_modified(|cancelled| {
            if *cancelled {
                false
            } else {
                *cancelled = true;
                true
            }
        })
    }

    /// Whether `cancel` has been called.
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelSignal {
    /// Whether the token has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once the token fires. A dropped token counts as fired.
    pub async fn cancelled(&mut self) {
        let _ = self.rx.wait_for(|cancelled| *cancelled).await;
    }
}

/// Join point for background tasks that must be fully stopped before the
/// resources they use are released.
#[derive(Debug, Default)]
pub struct ShutdownBarrier {
    tasks: JoinSet<()>,
}

impl ShutdownBarrier {
    /// Empty barrier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register and start a task.
    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.spawn(task);
    }

    /// Tasks registered and not yet joined.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no task is left to join.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait until every registered task has exited. Returns how many were
    /// joined. A task that panicked is logged and counted as stopped.
    pub async fn wait(&mut self) -> usize {
        let mut joined = 0;
        while let Some(result) = self.tasks.join_next().await {
            joined += 1;
            if let Err(e) = result {
                error!(error = %e, "background task did not exit cleanly");
            }
        }
        debug!(joined, "shutdown barrier released");
        joined
    }
}
