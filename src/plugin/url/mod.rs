//! `url` actions: open a link with the platform opener

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::plugin::command::CommandSpec;
use crate::plugin::{Action, ActionFactory, ActionManifest, ActionMetadata, ActionState};

/// Action that opens a URL
#[derive(Debug, Clone)]
pub struct UrlAction {
    metadata: ActionMetadata,
    url: String,
    requires: Vec<PathBuf>,
}

impl UrlAction {
    pub fn new(metadata: ActionMetadata, url: impl Into<String>) -> Self {
        Self {
            metadata,
            url: url.into(),
            requires: Vec::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Command that opens this action's URL on the current platform
    pub fn opener(&self) -> CommandSpec {
        if cfg!(target_os = "macos") {
            CommandSpec::new("open").arg(&self.url)
        } else if cfg!(target_os = "windows") {
            CommandSpec::new("cmd").arg("/C").arg("start").arg("").arg(&self.url)
        } else {
            CommandSpec::new("xdg-open").arg(&self.url)
        }
    }
}

impl Action for UrlAction {
    fn metadata(&self) -> &ActionMetadata {
        &self.metadata
    }

    fn state(&self) -> ActionState {
        if self.requires.iter().any(|p| !p.exists()) {
            ActionState::INVALID
        } else {
            ActionState::VALID
        }
    }

    fn run(&self) -> Result<()> {
        self.opener().spawn()
    }
}

#[derive(Debug, Deserialize)]
struct UrlSettings {
    url: String,

    #[serde(default)]
    requires: Vec<PathBuf>,
}

/// URL action factory
pub struct UrlActionFactory;

#[async_trait]
impl ActionFactory for UrlActionFactory {
    fn kind(&self) -> &str {
        "url"
    }

    async fn create_action(&self, manifest: &ActionManifest) -> Result<Arc<dyn Action>> {
        let settings: UrlSettings = manifest.settings()?;

        Ok(Arc::new(UrlAction {
            metadata: manifest.metadata(),
            url: settings.url,
            requires: settings
                .requires
                .iter()
                .map(|p| manifest.resolve_path(p))
                .collect(),
        }))
    }
}
