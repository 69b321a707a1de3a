//! Common plugin infrastructure for launchpad
//!
//! Every discovered plugin is an [`Action`]: something with an identity, a set
//! of display groups, a validity state, a `run` entry point and an optional
//! status probe. Plugins are described on disk by an [`ActionManifest`] and
//! turned into actions by the [`ActionFactory`] registered for the manifest's
//! `kind`.

pub mod manifest;
pub mod state;
pub mod traits;

pub use manifest::*;
pub use state::*;
pub use traits::*;

/// Action identifier
pub type ActionId = String;

/// Group used for actions that declare no groups
pub const UNCATEGORISED: &str = "Uncategorised";
