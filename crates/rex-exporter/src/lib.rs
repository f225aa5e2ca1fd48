//! Round exporter plugin.
//!
//! [`IndexerExporter`] sits at the end of a block pipeline and writes each
//! round into a storage engine while a retention task prunes old rounds in
//! the background. It provides:
//!
//! - a startup handshake that refuses to run unless the upstream pipeline
//!   and the storage engine agree on the next round
//! - strictly sequential ingestion that advances a shared round counter
//!   only after a durable write
//! - a shutdown sequence that stops the retention task before the storage
//!   handle is released
//!
//! Hosts construct exporters through an [`ExporterRegistry`] they own.

pub mod config;
pub mod error;
pub mod exporter;
pub mod plugin;
pub mod registry;

pub use config::ExporterConfig;
pub use error::{ExporterError, ExporterResult};
pub use exporter::{IndexerExporter, LifecycleState, PLUGIN_NAME};
pub use plugin::{Exporter, InitProvider, Metadata, PluginConfig, StaticInitProvider};
pub use registry::{ExporterConstructor, ExporterRegistry};
