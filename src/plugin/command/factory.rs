//! Command action factory

use anyhow::Result;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

use super::action::CommandAction;
use super::spec::CommandSpec;
use crate::plugin::{Action, ActionFactory, ActionManifest};

/// Kind-specific manifest fields for `command` actions
#[derive(Debug, Clone, Deserialize)]
struct CommandSettings {
    program: String,

    #[serde(default)]
    args: Vec<String>,

    #[serde(default)]
    working_dir: Option<PathBuf>,

    /// Paths that must all exist for the action to be valid
    #[serde(default)]
    requires: Vec<PathBuf>,

    #[serde(default)]
    disabled_when_exists: Option<PathBuf>,

    /// Status probe command; its stdout is the status message
    #[serde(default)]
    status: Option<CommandSpec>,

    /// Supplementary commands, by display name
    #[serde(default)]
    actions: IndexMap<String, CommandSpec>,
}

/// Command action factory
pub struct CommandActionFactory;

#[async_trait]
impl ActionFactory for CommandActionFactory {
    fn kind(&self) -> &str {
        "command"
    }

    async fn create_action(&self, manifest: &ActionManifest) -> Result<Arc<dyn Action>> {
        let settings: CommandSettings = manifest.settings()?;
        let anchor = |path: &std::path::Path| manifest.resolve_path(path);

        let command = CommandSpec {
            program: settings.program,
            args: settings.args,
            working_dir: settings.working_dir,
        }
        .anchored_at(anchor);

        Ok(Arc::new(CommandAction {
            metadata: manifest.metadata(),
            command,
            requires: settings.requires.iter().map(|p| anchor(p.as_path())).collect(),
            disabled_when_exists: settings.disabled_when_exists.as_deref().map(anchor),
            status: settings.status.map(|spec| spec.anchored_at(anchor)),
            sub_actions: settings
                .actions
                .into_iter()
                .map(|(name, spec)| (name, spec.anchored_at(anchor)))
                .collect(),
            probe_delay: manifest.status_probe_delay(),
        }))
    }
}
