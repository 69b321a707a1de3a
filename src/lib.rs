//! LaunchPad Library
//!
//! Discovers small action plugins from configurable directories, groups
//! them for display, runs them and keeps their status up to date through an
//! asynchronous poller.

pub mod cli;
pub mod config;
pub mod plugin;
pub mod poller;
pub mod utils;

pub use config::Config;
pub use plugin::{
    Action, ActionFactory, ActionFactoryManager, ActionHandle, ActionManifest, ActionMetadata,
    ActionState, DiscoveryWarning, DuplicatePolicy, PluginRegistry, RegistryError,
    RegistrySnapshot, ScanOptions,
};
pub use poller::{
    PollOutcome, PollRequest, PollResult, PollerOptions, StatusAlert, StatusPoller, StatusTracker,
};

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Errors raised while building a [`LaunchPad`]
#[derive(thiserror::Error, Debug)]
pub enum LaunchPadError {
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Why an action could not be run
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    #[error("Action not found: {0}")]
    NotFound(String),

    #[error("Action {0} is disabled")]
    Disabled(String),

    #[error("Action {0} is not available on this system")]
    Invalid(String),

    #[error("Action {identifier} has no sub-action named `{name}`")]
    UnknownSubAction { identifier: String, name: String },

    #[error("Action {identifier} failed: {message}")]
    Failed { identifier: String, message: String },

    #[error("Action {0} panicked")]
    Panicked(String),
}

impl From<RegistryError> for RunError {
    fn from(error: RegistryError) -> Self {
        match error {
            RegistryError::NotFound(identifier) => RunError::NotFound(identifier),
        }
    }
}

/// Main application context that owns the registry and the status poller
pub struct LaunchPad {
    config: Config,
    registry: Arc<PluginRegistry>,
    poller: StatusPoller,
    results: Option<mpsc::UnboundedReceiver<PollResult>>,
}

impl LaunchPad {
    /// Create a new LaunchPad with the built-in action kinds
    pub async fn new(config: Config) -> Result<Self, LaunchPadError> {
        Self::with_factories(config, Arc::new(ActionFactoryManager::with_builtins())).await
    }

    /// Create a new LaunchPad with a custom set of action kinds
    pub async fn with_factories(
        config: Config,
        factories: Arc<ActionFactoryManager>,
    ) -> Result<Self, LaunchPadError> {
        config
            .validate()
            .map_err(|e| LaunchPadError::Config(e.to_string()))?;
        let paths = config
            .expanded_search_paths()
            .map_err(|e| LaunchPadError::Config(e.to_string()))?;

        info!("Initializing LaunchPad with {} search path(s)", paths.len());
        let registry = Arc::new(
            PluginRegistry::with_factories(paths, config.scan_options(), factories).await,
        );
        let (poller, results) = StatusPoller::new(Arc::clone(&registry), config.poller_options());

        Ok(Self {
            config,
            registry,
            poller,
            results: Some(results),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }

    pub fn poller(&self) -> &StatusPoller {
        &self.poller
    }

    /// Take the receiver poll results are delivered on. Only the first call
    /// returns it.
    pub fn take_results(&mut self) -> Option<mpsc::UnboundedReceiver<PollResult>> {
        self.results.take()
    }

    /// Listed identifiers, honouring the `show_beta` setting
    pub fn identifiers(&self) -> Vec<String> {
        self.registry.identifiers(self.config.show_beta)
    }

    /// Pinned actions that are currently available, in pin order
    pub fn pinned(&self) -> Vec<String> {
        self.config
            .pinned
            .iter()
            .filter(|identifier| {
                self.registry
                    .state(identifier)
                    .map(|state| !state.is_invalid())
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    /// Names of the sub-actions an action offers
    pub fn sub_actions(&self, identifier: &str) -> Result<Vec<String>, RunError> {
        let handle = self.registry.request(identifier)?;
        Ok(handle.action().sub_actions().into_keys().collect())
    }

    /// Run an action, then re-poll its status.
    ///
    /// Failures are returned, never propagated as panics.
    pub async fn run(&self, identifier: &str) -> Result<(), RunError> {
        let handle = self.runnable(identifier)?;
        let action = Arc::clone(handle.action());

        info!("Running action: {}", identifier);
        let outcome = run_blocking(identifier, move || action.run()).await;
        self.poller.trigger(identifier);
        outcome
    }

    /// Run one of an action's sub-actions, then re-poll its status
    pub async fn run_sub_action(&self, identifier: &str, name: &str) -> Result<(), RunError> {
        let handle = self.runnable(identifier)?;
        let sub_action = handle
            .action()
            .sub_actions()
            .shift_remove(name)
            .ok_or_else(|| RunError::UnknownSubAction {
                identifier: identifier.to_string(),
                name: name.to_string(),
            })?;

        info!("Running sub-action `{}` of {}", name, identifier);
        let outcome = run_blocking(identifier, move || sub_action()).await;
        self.poller.trigger(identifier);
        outcome
    }

    /// Resolve an action and refuse it unless it can be run
    fn runnable(&self, identifier: &str) -> Result<ActionHandle, RunError> {
        let handle = self.registry.request(identifier)?;
        let state = handle.state();

        if state.is_invalid() {
            warn!("Refusing to run invalid action: {}", identifier);
            return Err(RunError::Invalid(identifier.to_string()));
        }
        if state.is_disabled() {
            warn!("Refusing to run disabled action: {}", identifier);
            return Err(RunError::Disabled(identifier.to_string()));
        }
        Ok(handle)
    }
}

/// Run plugin code on the blocking pool, turning failures into [`RunError`]
async fn run_blocking<F>(identifier: &str, f: F) -> Result<(), RunError>
where
    F: FnOnce() -> anyhow::Result<()> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            error!("Action {} failed: {:#}", identifier, e);
            Err(RunError::Failed {
                identifier: identifier.to_string(),
                message: format!("{:#}", e),
            })
        }
        Err(e) => {
            error!("Action {} panicked: {}", identifier, e);
            Err(RunError::Panicked(identifier.to_string()))
        }
    }
}
