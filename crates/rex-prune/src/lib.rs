//! Retention pruning for the round exporter.
//!
//! A pruning task runs next to ingestion, watches the live round counter,
//! and deletes rounds that fall outside the retention window. This crate
//! defines the coordination contract the exporter relies on:
//!
//! - [`PruningTask`] -- starts the background work inside a [`ShutdownBarrier`]
//! - [`CancelToken`] / [`CancelSignal`] -- one-shot cancellation
//! - [`RetentionPolicy`] -- window size and pass frequency
//!
//! [`RetentionPruner`] is the default delete loop.

pub mod policy;
pub mod pruner;
pub mod shutdown;
pub mod task;

pub use policy::RetentionPolicy;
pub use pruner::RetentionPruner;
pub use shutdown::{CancelSignal, CancelToken, ShutdownBarrier};
pub use task::{PruneContext, PruningTask};
