//! Action validity states

use std::panic::{self, AssertUnwindSafe};

use bitflags::bitflags;
use tracing::warn;

use crate::traits::Action;

bitflags! {
    /// Validity of an action.
    ///
    /// This is a set rather than a single value: an action may be reported as
    /// usable and at the same time refuse to run, which is how "visible but
    /// temporarily not runnable" is expressed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ActionState: u8 {
        /// The action is usable
        const VALID = 1;

        /// Prerequisites are not met; the action is hidden from listings
        const INVALID = 1 << 1;

        /// The action is listed but running it is refused
        const DISABLED = 1 << 2;
    }
}

impl ActionState {
    /// Whether the action should be hidden from listings
    pub fn is_invalid(self) -> bool {
        self.contains(ActionState::INVALID)
    }

    /// Whether the action is listed but must not be run
    pub fn is_disabled(self) -> bool {
        self.contains(ActionState::DISABLED)
    }

    /// Whether `run` may be invoked
    pub fn is_runnable(self) -> bool {
        !self.is_invalid() && !self.is_disabled()
    }

    /// Short label for terminal output
    pub fn label(self) -> &'static str {
        if self.is_invalid() {
            "invalid"
        } else if self.is_disabled() {
            "disabled"
        } else {
            "valid"
        }
    }
}

impl Default for ActionState {
    fn default() -> Self {
        ActionState::VALID
    }
}

/// Evaluate an action's state, treating a panicking check as `INVALID`.
///
/// Plugin code is not trusted, so a validity check that blows up must never
/// take the caller down with it.
pub fn evaluate_state(action: &dyn Action) -> ActionState {
    match panic::catch_unwind(AssertUnwindSafe(|| action.state())) {
        Ok(state) => state,
        Err(_) => {
            warn!(
                "Validity check panicked for action {}; treating it as invalid",
                action.identifier()
            );
            ActionState::INVALID
        }
    }
}
