use std::collections::BTreeMap;
use std::fmt;

use crate::error::{ExporterError, ExporterResult};
use crate::plugin::{Exporter, Metadata};

/// Builds a fresh, uninitialized exporter.
pub type ExporterConstructor = Box<dyn Fn() -> Box<dyn Exporter> + Send + Sync>;

/// Name to constructor mapping owned by the host's composition root.
///
/// Nothing registers itself: the host decides which exporters exist and
/// how their collaborators (storage backends, pruning tasks) are wired.
#[derive(Default)]
pub struct ExporterRegistry {
    constructors: BTreeMap<String, ExporterConstructor>,
}

impl ExporterRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `constructor` under `name`. Names must be unique.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F) -> ExporterResult<()>
    where
        F: Fn() -> Box<dyn Exporter> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.constructors.contains_key(&name) {
            return Err(ExporterError::Registry(format!(
                "exporter already registered: {name}"
            )));
        }
        self.constructors.insert(name, Box::new(constructor));
        Ok(())
    }

    /// Construct a new exporter by name.
    pub fn build(&self, name: &str) -> ExporterResult<Box<dyn Exporter>> {
        self.constructors
            .get(name)
            .map(|constructor| constructor())
            .ok_or_else(|| ExporterError::Registry(format!("no exporter named {name}")))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    /// Metadata of every registered exporter, by name.
    pub fn metadata(&self) -> Vec<Metadata> {
        self.constructors.values().map(|c| c().metadata()).collect()
    }

    /// Number of registered exporters.
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl fmt::Debug for ExporterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExporterRegistry")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use rex_store::InMemoryStorageEngine;

    use crate::exporter::{IndexerExporter, LifecycleState, PLUGIN_NAME};
    use crate::plugin::{PluginConfig, StaticInitProvider};

    fn registry() -> ExporterRegistry {
        let backend = Arc::new(InMemoryStorageEngine::new());
        let mut registry = ExporterRegistry::new();
        registry
            .register(PLUGIN_NAME, move || {
                Box::new(IndexerExporter::new(backend.clone())) as Box<dyn Exporter>
            })
            .unwrap();
        registry
    }

    #[test]
    fn duplicate_names_rejected() {
        let mut registry = registry();
        let err = registry
            .register(PLUGIN_NAME, || {
                Box::new(IndexerExporter::new(Arc::new(InMemoryStorageEngine::new())))
                    as Box<dyn Exporter>
            })
            .unwrap_err();
        assert!(matches!(err, ExporterError::Registry(_)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unknown_name_is_an_error() {
        assert!(matches!(
            registry().build("kafka"),
            Err(ExporterError::Registry(_))
        ));
    }

    #[test]
    fn lists_names_and_metadata() {
        let registry = registry();
        assert_eq!(registry.names(), vec![PLUGIN_NAME]);
        let meta = registry.metadata();
        assert_eq!(meta.len(), 1);
        assert_eq!(meta[0].name, PLUGIN_NAME);
        assert!(!registry.is_empty());
        assert!(format!("{registry:?}").contains(PLUGIN_NAME));
    }

    #[tokio::test]
    async fn builds_independent_instances() {
        let registry = registry();
        let mut first = registry.build(PLUGIN_NAME).unwrap();
        let mut second = registry.build(PLUGIN_NAME).unwrap();

        let provider = StaticInitProvider::new(rex_types::GenesisDescriptor::new("devnet", vec![]), 0);
        first
            .init(&provider, PluginConfig::from_toml("test = true"))
            .await
            .unwrap();
        // The second instance is still uninitialized and can be set up on its own.
        second
            .init(&provider, PluginConfig::from_toml("test = true"))
            .await
            .unwrap();

        first.close().await.unwrap();
        second.close().await.unwrap();

        let fresh = IndexerExporter::new(Arc::new(InMemoryStorageEngine::new()));
        assert_eq!(fresh.state(), LifecycleState::Uninitialized);
    }
}
