//! Status change detection

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use super::PollResult;

/// An interesting status transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusAlert {
    pub identifier: String,
    pub previous: Option<String>,
    pub current: Option<String>,
    pub observed_at: DateTime<Utc>,
}

impl StatusAlert {
    /// Whether the alert clears a previously reported status
    pub fn is_cleared(&self) -> bool {
        self.current.is_none()
    }
}

/// Last known status per action.
///
/// A transition is worth surfacing when it is the first observation and
/// carries a status, or when the status differs from the previous one. A
/// return to "no status" counts as a change so stale alerts get cleared.
#[derive(Debug, Default)]
pub struct StatusTracker {
    last: HashMap<String, Option<String>>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a poll result
    pub fn observe(&mut self, result: &PollResult) -> Option<StatusAlert> {
        self.record(&result.identifier, result.status.clone(), result.observed_at)
    }

    /// Record an observed status for an action
    pub fn record(
        &mut self,
        identifier: &str,
        status: Option<String>,
        observed_at: DateTime<Utc>,
    ) -> Option<StatusAlert> {
        let previous = self.last.insert(identifier.to_string(), status.clone());

        let interesting = match &previous {
            None => status.is_some(),
            Some(previous) => *previous != status,
        };

        interesting.then(|| StatusAlert {
            identifier: identifier.to_string(),
            previous: previous.flatten(),
            current: status,
            observed_at,
        })
    }

    /// Last known status of an action
    pub fn current(&self, identifier: &str) -> Option<&str> {
        self.last.get(identifier).and_then(|status| status.as_deref())
    }

    /// Identifiers that currently have a status, sorted
    pub fn alerting(&self) -> Vec<&str> {
        let mut alerting: Vec<&str> = self
            .last
            .iter()
            .filter(|(_, status)| status.is_some())
            .map(|(identifier, _)| identifier.as_str())
            .collect();
        alerting.sort_unstable();
        alerting
    }

    /// Stop tracking an action, e.g. after it disappeared from the registry
    pub fn forget(&mut self, identifier: &str) {
        self.last.remove(identifier);
    }
}
