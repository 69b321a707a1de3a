//! Action factory trait

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use super::action::Action;
use crate::ActionManifest;

/// Builds actions for one manifest `kind`.
///
/// A factory is the explicit registration point for a kind of plugin: the
/// registry only indexes actions produced by a factory, so a manifest whose
/// kind has no factory never reaches the snapshot.
#[async_trait]
pub trait ActionFactory: Send + Sync {
    /// Manifest kind handled by this factory
    fn kind(&self) -> &str;

    /// Create an action from a single, already expanded manifest
    async fn create_action(&self, manifest: &ActionManifest) -> Result<Arc<dyn Action>>;
}
