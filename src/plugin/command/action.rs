//! Command action

use anyhow::Result;
use indexmap::IndexMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::spec::CommandSpec;
use crate::plugin::{Action, ActionMetadata, ActionState, SubAction};

/// Action that launches a program.
///
/// It is invalid while its program cannot be found or any required path is
/// missing, and disabled while its `disabled_when_exists` path exists.
#[derive(Debug, Clone)]
pub struct CommandAction {
    pub(crate) metadata: ActionMetadata,
    pub(crate) command: CommandSpec,
    pub(crate) requires: Vec<PathBuf>,
    pub(crate) disabled_when_exists: Option<PathBuf>,
    pub(crate) status: Option<CommandSpec>,
    pub(crate) sub_actions: IndexMap<String, CommandSpec>,
    pub(crate) probe_delay: Duration,
}

impl CommandAction {
    pub fn new(metadata: ActionMetadata, command: CommandSpec) -> Self {
        Self {
            metadata,
            command,
            requires: Vec::new(),
            disabled_when_exists: None,
            status: None,
            sub_actions: IndexMap::new(),
            probe_delay: Duration::ZERO,
        }
    }

    pub fn command(&self) -> &CommandSpec {
        &self.command
    }
}

impl Action for CommandAction {
    fn metadata(&self) -> &ActionMetadata {
        &self.metadata
    }

    fn state(&self) -> ActionState {
        if self.command.resolve_program().is_none() || self.requires.iter().any(|p| !p.exists()) {
            return ActionState::INVALID;
        }

        match &self.disabled_when_exists {
            Some(path) if path.exists() => ActionState::VALID | ActionState::DISABLED,
            _ => ActionState::VALID,
        }
    }

    fn run(&self) -> Result<()> {
        self.command.spawn()
    }

    fn status(&self) -> Result<Option<String>> {
        match &self.status {
            Some(probe) => probe.output(),
            None => Ok(None),
        }
    }

    fn status_probe_delay(&self) -> Duration {
        self.probe_delay
    }

    fn sub_actions(&self) -> IndexMap<String, SubAction> {
        self.sub_actions
            .iter()
            .map(|(name, spec)| {
                let spec = spec.clone();
                let callable: SubAction = Arc::new(move || spec.spawn());
                (name.clone(), callable)
            })
            .collect()
    }
}
