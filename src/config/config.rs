//! Main configuration structure and implementation

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::plugin::{DuplicatePolicy, ScanOptions};
use crate::poller::PollerOptions;
use crate::utils;

/// Supported configuration version
pub const CONFIG_VERSION: &str = "1.0";

/// Default delay between two polling rounds
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 1800;

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Directories scanned for action manifests, in priority order
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,

    /// Descend into subdirectories of each search path
    #[serde(default)]
    pub recursive: bool,

    /// How identifier collisions are resolved
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,

    /// List and poll beta actions
    #[serde(default)]
    pub show_beta: bool,

    /// Seconds between two polling rounds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Upper bound for a single status probe
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe_timeout_secs: Option<u64>,

    /// Favourite action identifiers
    #[serde(default)]
    pub pinned: Vec<String>,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {:?}", path))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse configuration file {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            utils::ensure_directory(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.version != CONFIG_VERSION {
            return Err(anyhow!(
                "Unsupported configuration version: {}",
                self.version
            ));
        }

        if self.poll_interval_secs == 0 {
            return Err(anyhow!("poll_interval_secs must be greater than zero"));
        }

        if self.probe_timeout_secs == Some(0) {
            return Err(anyhow!("probe_timeout_secs must be greater than zero"));
        }

        if self.search_paths.iter().any(|p| p.as_os_str().is_empty()) {
            return Err(anyhow!("Search paths must not be empty"));
        }

        Ok(())
    }

    /// Location of the per-user configuration file
    pub fn user_config_path() -> Result<PathBuf> {
        Ok(utils::get_config_dir()?.join("config.yaml"))
    }

    /// Search paths with `~` and environment variables expanded
    pub fn expanded_search_paths(&self) -> Result<Vec<PathBuf>> {
        let paths = self
            .search_paths
            .iter()
            .map(|path| utils::expand_path(path))
            .collect::<Result<Vec<_>>>()?;
        Ok(utils::dedup_paths(paths))
    }

    /// Discovery options for the registry
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            recursive: self.recursive,
            duplicate_policy: self.duplicate_policy,
        }
    }

    /// Options for the status poller
    pub fn poller_options(&self) -> PollerOptions {
        PollerOptions {
            include_beta: self.show_beta,
            probe_timeout: self.probe_timeout_secs.map(Duration::from_secs),
        }
    }

    /// Delay between two polling rounds
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Add a search path. Returns false if it is already configured.
    pub fn add_search_path(&mut self, path: PathBuf) -> bool {
        if self.search_paths.contains(&path) {
            return false;
        }
        self.search_paths.push(path);
        true
    }

    /// Remove a search path. Returns false if it was not configured.
    pub fn remove_search_path(&mut self, path: &Path) -> bool {
        let before = self.search_paths.len();
        self.search_paths.retain(|p| p != path);
        self.search_paths.len() != before
    }

    /// Pin an action. Returns false if it is already pinned.
    pub fn pin(&mut self, identifier: &str) -> bool {
        if self.pinned.iter().any(|p| p == identifier) {
            return false;
        }
        self.pinned.push(identifier.to_string());
        true
    }

    /// Unpin an action. Returns false if it was not pinned.
    pub fn unpin(&mut self, identifier: &str) -> bool {
        let before = self.pinned.len();
        self.pinned.retain(|p| p != identifier);
        self.pinned.len() != before
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            search_paths: vec![
                PathBuf::from("./plugins"),
                PathBuf::from("~/.config/launchpad/plugins"),
            ],
            recursive: false,
            duplicate_policy: DuplicatePolicy::default(),
            show_beta: false,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            probe_timeout_secs: None,
            pinned: Vec::new(),
        }
    }
}
