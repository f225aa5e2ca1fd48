use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use rex_types::{BlockUnit, GenesisDescriptor, Round};

use crate::error::{ExporterError, ExporterResult};

/// Static description of an exporter plugin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub name: &'static str,
    pub description: &'static str,
    pub deprecated: bool,
    pub sample_config: &'static str,
}

/// What the upstream pipeline tells an exporter at startup.
pub trait InitProvider: Send + Sync {
    fn genesis(&self) -> &GenesisDescriptor;

    /// The round the pipeline will deliver first.
    fn next_db_round(&self) -> Round;
}

/// Fixed [`InitProvider`], for hosts that already know both values.
#[derive(Clone, Debug)]
pub struct StaticInitProvider {
    pub genesis: GenesisDescriptor,
    pub next_round: Round,
}

impl StaticInitProvider {
    /// Provider reporting `genesis` and resuming at `next_round`.
    pub fn new(genesis: GenesisDescriptor, next_round: Round) -> Self {
        Self {
            genesis,
            next_round,
        }
    }
}

impl InitProvider for StaticInitProvider {
    fn genesis(&self) -> &GenesisDescriptor {
        &self.genesis
    }

    fn next_db_round(&self) -> Round {
        self.next_round
    }
}

/// Raw, not yet deserialized plugin configuration (TOML).
#[derive(Clone, Debug, Default)]
pub struct PluginConfig {
    raw: String,
    source: Option<PathBuf>,
}

impl PluginConfig {
    /// Configuration given inline.
    pub fn from_toml(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            source: None,
        }
    }

    /// Read the configuration from `path`.
    pub fn from_file(path: &Path) -> ExporterResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ExporterError::Configuration(format!("reading {}: {e}", path.display()))
        })?;
        Ok(Self {
            raw,
            source: Some(path.to_path_buf()),
        })
    }

    /// Raw TOML text.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// File the configuration was read from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Deserialize into the plugin's own configuration type.
    pub fn unmarshal<T: DeserializeOwned>(&self) -> ExporterResult<T> {
        toml::from_str(&self.raw).map_err(|e| match &self.source {
            Some(path) => ExporterError::Configuration(format!("{}: {e}", path.display())),
            None => ExporterError::Configuration(e.to_string()),
        })
    }
}

/// Contract between a pipeline host and an exporter plugin.
///
/// The host calls `init` once, then `receive` serially in round order,
/// then `close`. `receive` is never called concurrently with itself.
#[async_trait]
pub trait Exporter: Send {
    fn metadata(&self) -> Metadata;

    async fn init(&mut self, provider: &dyn InitProvider, config: PluginConfig)
        -> ExporterResult<()>;

    /// Active configuration rendered as TOML.
    fn config(&self) -> String;

    async fn receive(&mut self, unit: BlockUnit) -> ExporterResult<()>;

    async fn close(&mut self) -> ExporterResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use crate::config::ExporterConfig;

    #[test]
    fn unmarshal_reports_configuration_error() {
        let cfg = PluginConfig::from_toml("max-conn = \"many\"");
        let err = cfg.unmarshal::<ExporterConfig>().unwrap_err();
        assert!(matches!(err, ExporterError::Configuration(_)));
    }

    #[test]
    fn empty_config_uses_defaults() {
        let cfg = PluginConfig::default().unmarshal::<ExporterConfig>().unwrap();
        assert_eq!(cfg, ExporterConfig::default());
    }

    #[test]
    fn from_file_reads_and_names_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "test = true").unwrap();
        let cfg = PluginConfig::from_file(file.path()).unwrap();
        assert_eq!(cfg.source(), Some(file.path()));
        assert!(cfg.unmarshal::<ExporterConfig>().unwrap().test);

        writeln!(file, "max-conn = -1").unwrap();
        let cfg = PluginConfig::from_file(file.path()).unwrap();
        let msg = cfg.unmarshal::<ExporterConfig>().unwrap_err().to_string();
        assert!(msg.contains(&file.path().display().to_string()));
    }

    #[test]
    fn missing_file_is_configuration_error() {
        let err = PluginConfig::from_file(Path::new("/nonexistent/rex.toml")).unwrap_err();
        assert!(matches!(err, ExporterError::Configuration(_)));
    }

    #[test]
    fn static_provider() {
        let p = StaticInitProvider::new(GenesisDescriptor::new("devnet", vec![]), 12);
        assert_eq!(p.next_db_round(), 12);
        assert_eq!(p.genesis().network, "devnet");
    }
}
