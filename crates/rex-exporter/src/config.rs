use serde::{Deserialize, Serialize};

use rex_prune::RetentionPolicy;
use rex_store::ConnectionParams;

use crate::error::{ExporterError, ExporterResult};

/// Exporter configuration, as read from the plugin's TOML section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ExporterConfig {
    /// Storage engine connection string. Required unless `test` is set.
    pub connection_string: String,
    /// Upper bound on connections the storage engine may open.
    pub max_conn: u32,
    /// Substitute a non-persistent backend. Pruning never runs in test mode.
    pub test: bool,
    /// Retention policy for the background delete task.
    pub delete_task: RetentionPolicy,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            connection_string: String::new(),
            max_conn: 20,
            test: false,
            delete_task: RetentionPolicy::default(),
        }
    }
}

impl ExporterConfig {
    /// Configuration for the non-persistent test backend.
    pub fn test_mode() -> Self {
        Self {
            test: true,
            ..Default::default()
        }
    }

    /// Defaults with the given connection string.
    pub fn with_connection_string(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            ..Default::default()
        }
    }

    /// Reject configurations the exporter must not start with.
    ///
    /// An empty connection string is an error outside test mode: some
    /// drivers silently fall back to a local default instance, and the
    /// exporter must never write into whatever database happens to answer.
    pub fn validate(&self) -> ExporterResult<()> {
        if !self.test && self.connection_string.trim().is_empty() {
            return Err(ExporterError::Configuration(
                "connection string is empty".into(),
            ));
        }
        Ok(())
    }

    /// Whether a retention task should run: never in test mode.
    pub fn pruning_enabled(&self) -> bool {
        !self.test && self.delete_task.is_enabled()
    }

    /// Read-write connection parameters.
    pub fn connection_params(&self) -> ConnectionParams {
        ConnectionParams {
            connection_string: self.connection_string.clone(),
            max_conn: self.max_conn,
            read_only: false,
        }
    }

    /// Render as TOML, in the same shape the exporter reads.
    pub fn to_toml(&self) -> ExporterResult<String> {
        toml::to_string(self).map_err(|e| ExporterError::Configuration(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ExporterConfig::default();
        assert_eq!(c.max_conn, 20);
        assert!(!c.test);
        assert!(!c.pruning_enabled());
    }

    #[test]
    fn empty_connection_string_rejected_outside_test_mode() {
        assert!(matches!(
            ExporterConfig::default().validate(),
            Err(ExporterError::Configuration(_))
        ));
        assert!(matches!(
            ExporterConfig::with_connection_string("   ").validate(),
            Err(ExporterError::Configuration(_))
        ));
        assert!(ExporterConfig::test_mode().validate().is_ok());
        assert!(ExporterConfig::with_connection_string("host=db").validate().is_ok());
    }

    #[test]
    fn test_mode_never_prunes() {
        let mut c = ExporterConfig::test_mode();
        c.delete_task = RetentionPolicy::keep_last(10);
        assert!(!c.pruning_enabled());
        c.test = false;
        assert!(c.pruning_enabled());
    }

    #[test]
    fn connection_params_are_read_write() {
        let mut c = ExporterConfig::with_connection_string("host=db");
        c.max_conn = 7;
        let p = c.connection_params();
        assert_eq!(p.connection_string, "host=db");
        assert_eq!(p.max_conn, 7);
        assert!(!p.read_only);
    }

    #[test]
    fn parses_kebab_case_toml() {
        let text = r#"
            connection-string = "host=db"
            max-conn = 4

            [delete-task]
            rounds = 100
            interval = 10
        "#;
        let c: ExporterConfig = toml::from_str(text).unwrap();
        assert_eq!(c.connection_string, "host=db");
        assert_eq!(c.max_conn, 4);
        assert_eq!(c.delete_task.rounds, 100);
        assert_eq!(c.delete_task.interval, 10);
        assert_eq!(c.delete_task.poll_ms, 1_000);
    }

    #[test]
    fn toml_rendering_parses_back() {
        let mut c = ExporterConfig::with_connection_string("host=db");
        c.delete_task = RetentionPolicy::keep_last(3);
        let text = c.to_toml().unwrap();
        assert!(text.contains("connection-string"));
        assert!(text.contains("[delete-task]"));
        assert_eq!(toml::from_str::<ExporterConfig>(&text).unwrap(), c);
    }
}
