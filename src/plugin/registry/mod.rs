//! Plugin registry for action discovery and lookup
//!
//! The registry owns an immutable [`RegistrySnapshot`]. Every change to the
//! search paths rescans them into a brand new snapshot which is swapped in
//! atomically, so readers holding the previous snapshot never see a partial
//! update.

use arc_swap::ArcSwap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{evaluate_state, Action, ActionFactory, ActionFactoryManager, ActionState};
use crate::utils;

#[cfg(test)]
mod tests;

/// Registry errors
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Action not found: {0}")]
    NotFound(String),
}

/// How identifier collisions between loaded actions are resolved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep the first definition in scan order
    #[default]
    FirstWins,

    /// Keep the last definition, at the position of the first
    LastWins,

    /// Drop every definition of a colliding identifier
    RejectBoth,
}

/// Discovery options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Descend into subdirectories of each search path
    pub recursive: bool,

    /// Identifier collision policy
    pub duplicate_policy: DuplicatePolicy,
}

/// A problem found while scanning; the scan always continues past it
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryWarning {
    #[error("Search path does not exist: {0:?}")]
    MissingDirectory(PathBuf),

    #[error("Failed to read manifest {path:?}: {message}")]
    Unreadable { path: PathBuf, message: String },

    #[error("Invalid manifest {path:?}: {message}")]
    InvalidManifest { path: PathBuf, message: String },

    #[error("Unknown action kind `{kind}` in {path:?}")]
    UnknownKind { path: PathBuf, kind: String },

    #[error("Duplicate action identifier `{identifier}` in {dropped:?}")]
    Duplicate {
        identifier: String,
        dropped: Option<PathBuf>,
    },
}

impl DiscoveryWarning {
    pub(crate) fn invalid(path: &Path, error: impl fmt::Display) -> Self {
        DiscoveryWarning::InvalidManifest {
            path: path.to_path_buf(),
            message: error.to_string(),
        }
    }
}

/// Immutable point-in-time view of the loaded actions
#[derive(Debug, Default)]
pub struct RegistrySnapshot {
    paths: Vec<PathBuf>,
    actions: Vec<Arc<dyn Action>>,
    index: HashMap<String, usize>,
    warnings: Vec<DiscoveryWarning>,
}

impl RegistrySnapshot {
    fn new(
        paths: Vec<PathBuf>,
        actions: Vec<Arc<dyn Action>>,
        warnings: Vec<DiscoveryWarning>,
    ) -> Self {
        let index = actions
            .iter()
            .enumerate()
            .map(|(i, action)| (action.identifier().to_string(), i))
            .collect();
        Self {
            paths,
            actions,
            index,
            warnings,
        }
    }

    /// Search paths that produced this snapshot
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Every loaded action in scan order, invalid and beta ones included
    pub fn actions(&self) -> &[Arc<dyn Action>] {
        &self.actions
    }

    /// Warnings recorded while scanning
    pub fn warnings(&self) -> &[DiscoveryWarning] {
        &self.warnings
    }

    /// Look up an action by identifier
    pub fn get(&self, identifier: &str) -> Option<&Arc<dyn Action>> {
        self.index.get(identifier).map(|&i| &self.actions[i])
    }

    /// Listable actions: not invalid, and not beta unless requested
    fn listed(&self, include_beta: bool) -> impl Iterator<Item = &Arc<dyn Action>> {
        self.actions.iter().filter(move |action| {
            (include_beta || !action.metadata().beta) && !evaluate_state(action.as_ref()).is_invalid()
        })
    }

    /// Identifiers of listable actions in scan order
    pub fn identifiers(&self, include_beta: bool) -> Vec<String> {
        self.listed(include_beta)
            .map(|action| action.identifier().to_string())
            .collect()
    }

    /// Identifiers of listable actions, by group.
    ///
    /// An action appears under every group it declares; untagged actions are
    /// placed under [`UNCATEGORISED`](super::UNCATEGORISED). Groups are
    /// ordered by first appearance.
    pub fn grouped_identifiers(&self, include_beta: bool) -> IndexMap<String, Vec<String>> {
        let mut grouped: IndexMap<String, Vec<String>> = IndexMap::new();
        for action in self.listed(include_beta) {
            for group in action.metadata().display_groups() {
                grouped
                    .entry(group.to_string())
                    .or_default()
                    .push(action.identifier().to_string());
            }
        }
        grouped
    }
}

/// A resolved action together with its state at the time of the request
#[derive(Debug, Clone)]
pub struct ActionHandle {
    action: Arc<dyn Action>,
    state: ActionState,
}

impl ActionHandle {
    fn resolve(action: Arc<dyn Action>) -> Self {
        let state = evaluate_state(action.as_ref());
        Self { action, state }
    }

    /// The underlying action
    pub fn action(&self) -> &Arc<dyn Action> {
        &self.action
    }

    /// State evaluated when the handle was requested
    pub fn state(&self) -> ActionState {
        self.state
    }

    pub fn identifier(&self) -> &str {
        self.action.identifier()
    }

    pub fn metadata(&self) -> &super::ActionMetadata {
        self.action.metadata()
    }
}

/// Plugin registry for discovering and querying actions
pub struct PluginRegistry {
    /// Current snapshot
    snapshot: ArcSwap<RegistrySnapshot>,

    /// Serialises path mutations and rescans
    mutation: Mutex<()>,

    /// Action factories by kind
    factories: Arc<ActionFactoryManager>,

    /// Discovery options
    options: ScanOptions,
}

impl PluginRegistry {
    /// Create a registry with the built-in action kinds and scan `paths`
    pub async fn new<I>(paths: I, options: ScanOptions) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        Self::with_factories(paths, options, Arc::new(ActionFactoryManager::with_builtins())).await
    }

    /// Create a registry with a custom set of factories and scan `paths`
    pub async fn with_factories<I>(
        paths: I,
        options: ScanOptions,
        factories: Arc<ActionFactoryManager>,
    ) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let paths = utils::dedup_paths(paths);
        let snapshot = scan(paths, &options, &factories).await;

        Self {
            snapshot: ArcSwap::from_pointee(snapshot),
            mutation: Mutex::new(()),
            factories,
            options,
        }
    }

    /// Register an additional action kind and rescan so it takes effect
    pub async fn register_factory(&self, factory: Arc<dyn ActionFactory>) {
        self.factories.register_factory(factory).await;
        self.rescan().await;
    }

    /// Current snapshot; hold on to it for a consistent view across queries
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.snapshot.load_full()
    }

    /// Discovery options in use
    pub fn options(&self) -> ScanOptions {
        self.options
    }

    /// Search paths in insertion order
    pub fn paths(&self) -> Vec<PathBuf> {
        self.snapshot.load().paths.clone()
    }

    /// Warnings recorded by the most recent scan
    pub fn warnings(&self) -> Vec<DiscoveryWarning> {
        self.snapshot.load().warnings.clone()
    }

    /// Add a search path and rescan. Returns false if it was already present.
    pub async fn add_path(&self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        let _guard = self.mutation.lock().await;

        let current = self.snapshot.load_full();
        if current.paths.contains(&path) {
            debug!("Search path already registered: {:?}", path);
            return false;
        }

        let mut paths = current.paths.clone();
        paths.push(path);
        self.replace(paths).await;
        true
    }

    /// Remove a search path and rescan. Returns false if it was not present.
    pub async fn remove_path(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        let _guard = self.mutation.lock().await;

        let current = self.snapshot.load_full();
        if !current.paths.iter().any(|p| p == path) {
            debug!("Search path not registered: {:?}", path);
            return false;
        }

        let paths = current
            .paths
            .iter()
            .filter(|p| p.as_path() != path)
            .cloned()
            .collect();
        self.replace(paths).await;
        true
    }

    /// Rescan the current search paths
    pub async fn rescan(&self) {
        let _guard = self.mutation.lock().await;
        let paths = self.snapshot.load().paths.clone();
        self.replace(paths).await;
    }

    async fn replace(&self, paths: Vec<PathBuf>) {
        let snapshot = scan(paths, &self.options, &self.factories).await;
        self.snapshot.store(Arc::new(snapshot));
    }

    /// Identifiers of listable actions in scan order
    pub fn identifiers(&self, include_beta: bool) -> Vec<String> {
        self.snapshot.load().identifiers(include_beta)
    }

    /// Identifiers of listable actions, by group
    pub fn grouped_identifiers(&self, include_beta: bool) -> IndexMap<String, Vec<String>> {
        self.snapshot.load().grouped_identifiers(include_beta)
    }

    /// Resolve an action, evaluating its current state
    pub fn request(&self, identifier: &str) -> Result<ActionHandle, RegistryError> {
        self.snapshot
            .load()
            .get(identifier)
            .cloned()
            .map(ActionHandle::resolve)
            .ok_or_else(|| RegistryError::NotFound(identifier.to_string()))
    }

    /// Current state of an action
    pub fn state(&self, identifier: &str) -> Result<ActionState, RegistryError> {
        self.request(identifier).map(|handle| handle.state())
    }
}

/// Load every search path into a new snapshot
async fn scan(
    paths: Vec<PathBuf>,
    options: &ScanOptions,
    factories: &ActionFactoryManager,
) -> RegistrySnapshot {
    let mut actions = Vec::new();
    let mut warnings = Vec::new();

    for dir in &paths {
        if !dir.is_dir() {
            warn!("Search path does not exist: {:?}", dir);
            warnings.push(DiscoveryWarning::MissingDirectory(dir.clone()));
            continue;
        }

        info!("Scanning search path: {:?}", dir);
        let (manifests, errors) = utils::find_manifest_files(dir, options.recursive);
        for error in errors {
            let warning = DiscoveryWarning::Unreadable {
                path: error.path().unwrap_or(dir.as_path()).to_path_buf(),
                message: error.to_string(),
            };
            warn!("{}", warning);
            warnings.push(warning);
        }

        for manifest in manifests {
            match factories.load_manifest(&manifest).await {
                Ok(loaded) => {
                    debug!("Loaded {} action(s) from {:?}", loaded.len(), manifest);
                    actions.extend(loaded);
                }
                Err(warning) => {
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }
    }

    let actions = dedup_actions(actions, options.duplicate_policy, &mut warnings);
    info!(
        "Discovery completed: {} action(s), {} warning(s)",
        actions.len(),
        warnings.len()
    );

    RegistrySnapshot::new(paths, actions, warnings)
}

/// Resolve identifier collisions according to `policy`
fn dedup_actions(
    actions: Vec<Arc<dyn Action>>,
    policy: DuplicatePolicy,
    warnings: &mut Vec<DiscoveryWarning>,
) -> Vec<Arc<dyn Action>> {
    let mut duplicate = |action: &Arc<dyn Action>| {
        let warning = DiscoveryWarning::Duplicate {
            identifier: action.identifier().to_string(),
            dropped: action.metadata().source.clone(),
        };
        warn!("{}", warning);
        warnings.push(warning);
    };

    match policy {
        DuplicatePolicy::FirstWins => {
            let mut seen = HashSet::new();
            let mut kept = Vec::with_capacity(actions.len());
            for action in actions {
                if seen.insert(action.identifier().to_string()) {
                    kept.push(action);
                } else {
                    duplicate(&action);
                }
            }
            kept
        }
        DuplicatePolicy::LastWins => {
            let mut position: HashMap<String, usize> = HashMap::new();
            let mut kept: Vec<Arc<dyn Action>> = Vec::with_capacity(actions.len());
            for action in actions {
                match position.get(action.identifier()) {
                    Some(&i) => {
                        duplicate(&kept[i]);
                        kept[i] = action;
                    }
                    None => {
                        position.insert(action.identifier().to_string(), kept.len());
                        kept.push(action);
                    }
                }
            }
            kept
        }
        DuplicatePolicy::RejectBoth => {
            let mut counts: HashMap<String, usize> = HashMap::new();
            for action in &actions {
                *counts.entry(action.identifier().to_string()).or_default() += 1;
            }
            actions
                .into_iter()
                .filter(|action| {
                    if counts[action.identifier()] > 1 {
                        duplicate(action);
                        false
                    } else {
                        true
                    }
                })
                .collect()
        }
    }
}
