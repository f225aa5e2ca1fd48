//! Foundation types for the round exporter.
//!
//! Every other `rex` crate depends on `rex-types`.
//!
//! # Key Types
//!
//! - [`Round`] — sequential block number, the unit of ingestion
//! - [`SharedRound`] — live, atomically published "next round to accept"
//! - [`BlockUnit`] — what the upstream pipeline hands to an exporter
//! - [`ValidatedBlock`] — block plus resolved delta, what storage persists
//! - [`GenesisDescriptor`] — baseline state imported before round 0
//! - [`Digest`] — BLAKE3 digest used for block and genesis hashes

pub mod block;
pub mod delta;
pub mod digest;
pub mod genesis;
pub mod round;

pub use block::{Block, BlockHeader, BlockUnit, SignedTxn, ValidatedBlock};
pub use delta::{AccountDelta, Address, LedgerStateDelta};
pub use digest::Digest;
pub use genesis::{GenesisAllocation, GenesisDescriptor};
pub use round::{Round, SharedRound};
