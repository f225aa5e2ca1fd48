//! Storage engine capability for the round exporter.
//!
//! The exporter never writes rows itself. It talks to a storage engine
//! through two object-safe traits:
//!
//! - [`StorageEngine`] -- opens a connection and hands back a
//!   [`StorageHandle`] plus a [`ReadySignal`]
//! - [`StorageHandle`] -- reports the next round to accept, imports
//!   genesis, persists validated blocks, and deletes old rounds
//!
//! [`ensure_initial_import`] performs the one-time genesis bootstrap.
//! [`InMemoryStorageEngine`] is the non-persistent backend used in test
//! mode and throughout the test suites.
//!
//! # Design Rules
//!
//! 1. The engine is the source of truth for the next round to accept.
//! 2. Blocks are accepted strictly in round order.
//! 3. A closed handle rejects every operation with [`StoreError::Closed`].
//! 4. All backend errors are propagated, never silently ignored.

pub mod bootstrap;
pub mod error;
pub mod memory;
pub mod traits;

pub use bootstrap::ensure_initial_import;
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStorageEngine;
pub use traits::{ConnectionParams, ReadyNotifier, ReadySignal, StorageEngine, StorageHandle};
