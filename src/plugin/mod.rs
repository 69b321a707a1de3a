//! Action kinds and the factories that load them

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

pub mod command;
pub mod registry;
pub mod url;

pub use command::{CommandAction, CommandActionFactory, CommandSpec};
pub use launchpad_plugin::*;
pub use registry::*;
pub use url::{UrlAction, UrlActionFactory};

/// Factories keyed by the manifest kind they handle
pub struct ActionFactoryManager {
    factories: RwLock<HashMap<String, Arc<dyn ActionFactory>>>,
}

impl ActionFactoryManager {
    /// Create a manager with no registered kinds
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
        }
    }

    /// Create a manager with the built-in `command` and `url` kinds
    pub fn with_builtins() -> Self {
        let mut factories: HashMap<String, Arc<dyn ActionFactory>> = HashMap::new();
        for factory in [
            Arc::new(CommandActionFactory) as Arc<dyn ActionFactory>,
            Arc::new(UrlActionFactory),
        ] {
            factories.insert(factory.kind().to_string(), factory);
        }
        Self {
            factories: RwLock::new(factories),
        }
    }

    /// Register a factory, replacing any previous factory for the same kind
    pub async fn register_factory(&self, factory: Arc<dyn ActionFactory>) {
        let kind = factory.kind().to_string();
        debug!("Registering action factory for kind: {}", kind);
        self.factories.write().await.insert(kind, factory);
    }

    /// Registered kinds, sorted
    pub async fn kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = self.factories.read().await.keys().cloned().collect();
        kinds.sort();
        kinds
    }

    /// Load every action a manifest file describes.
    ///
    /// Any failure is returned as the warning the registry records for the
    /// file; no partial result is produced for a broken manifest.
    pub async fn load_manifest(
        &self,
        path: &Path,
    ) -> Result<Vec<Arc<dyn Action>>, DiscoveryWarning> {
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| DiscoveryWarning::Unreadable {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;

        let manifest = ActionManifest::from_yaml(&content)
            .map_err(|e| DiscoveryWarning::invalid(path, e))?
            .with_source(path);

        let factory = self
            .factories
            .read()
            .await
            .get(&manifest.kind)
            .cloned()
            .ok_or_else(|| DiscoveryWarning::UnknownKind {
                path: path.to_path_buf(),
                kind: manifest.kind.clone(),
            })?;

        let mut actions = Vec::new();
        for variant in manifest
            .expand()
            .map_err(|e| DiscoveryWarning::invalid(path, e))?
        {
            let action = factory
                .create_action(&variant)
                .await
                .map_err(|e| DiscoveryWarning::invalid(path, e))?;
            actions.push(action);
        }

        Ok(actions)
    }
}

impl Default for ActionFactoryManager {
    fn default() -> Self {
        Self::with_builtins()
    }
}
