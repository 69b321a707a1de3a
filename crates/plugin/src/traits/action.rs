//! The action descriptor contract

use anyhow::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::{ActionId, ActionState, UNCATEGORISED};

/// A supplementary named operation exposed next to an action's main `run`
pub type SubAction = Arc<dyn Fn() -> Result<()> + Send + Sync>;

/// Display information shared by every action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionMetadata {
    /// Unique identifier within a registry snapshot
    pub identifier: ActionId,

    /// Display name
    pub name: String,

    /// Display description
    pub description: String,

    /// Display groups; empty means the implicit "Uncategorised" group
    pub groups: Vec<String>,

    /// Icon file, if the plugin ships one
    pub icon: Option<PathBuf>,

    /// Excluded from listings unless the caller opts in
    pub beta: bool,

    /// Manifest the action was loaded from
    pub source: Option<PathBuf>,
}

impl ActionMetadata {
    pub fn new(identifier: impl Into<ActionId>, name: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            name: name.into(),
            description: String::new(),
            groups: Vec::new(),
            icon: None,
            beta: false,
            source: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_beta(mut self, beta: bool) -> Self {
        self.beta = beta;
        self
    }

    pub fn with_icon(mut self, icon: impl Into<PathBuf>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Groups the action is listed under, falling back to "Uncategorised"
    pub fn display_groups(&self) -> Vec<&str> {
        if self.groups.is_empty() {
            vec![UNCATEGORISED]
        } else {
            self.groups.iter().map(String::as_str).collect()
        }
    }

    /// Icon to display, falling back to the default icon when the declared
    /// one is absent or missing on disk
    pub fn icon(&self) -> IconRef<'_> {
        match &self.icon {
            Some(path) if path.exists() => IconRef::Path(path),
            _ => IconRef::Default,
        }
    }
}

/// Resolved icon for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconRef<'a> {
    /// Plugin supplied icon file
    Path(&'a Path),

    /// The host's default icon
    Default,
}

impl fmt::Display for IconRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IconRef::Path(path) => write!(f, "{}", path.display()),
            IconRef::Default => f.write_str("default"),
        }
    }
}

/// Action trait that every discovered plugin implements.
///
/// Everything except `metadata` and `run` is optional. Implementations are
/// called from worker threads and may block; the host never calls them on its
/// coordinating task.
pub trait Action: Send + Sync + fmt::Debug {
    /// Get action metadata
    fn metadata(&self) -> &ActionMetadata;

    /// Unique identifier
    fn identifier(&self) -> &str {
        &self.metadata().identifier
    }

    /// Current validity, recomputed on every call
    fn state(&self) -> ActionState {
        ActionState::VALID
    }

    /// Invoke the action
    fn run(&self) -> Result<()>;

    /// Status message to surface as a badge, or `None` when there is nothing
    /// to report
    fn status(&self) -> Result<Option<String>> {
        Ok(None)
    }

    /// How long the poller waits before probing this action
    fn status_probe_delay(&self) -> Duration {
        Duration::ZERO
    }

    /// Supplementary operations, in display order
    fn sub_actions(&self) -> IndexMap<String, SubAction> {
        IndexMap::new()
    }
}
