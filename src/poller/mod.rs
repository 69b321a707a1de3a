//! Status polling engine
//!
//! Each probe runs on its own task and calls the plugin's status function on
//! the blocking pool, so neither the delay nor a slow plugin ever holds up
//! the caller. At most one probe per identifier is in flight: a poll for an
//! identifier that is already being probed is coalesced into the running one.
//! The in-flight marker is only cleared once the result has been sent and the
//! status call has returned, so the results for a single identifier arrive in
//! the order the probes ran, and a probe that timed out still blocks a second
//! call until the first one finishes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinError;
use tracing::{debug, info, warn};

use crate::plugin::{evaluate_state, PluginRegistry};

pub mod tracker;


pub use tracker::{StatusAlert, StatusTracker};

/// Shortest interval accepted by [`StatusPoller::run_periodic`]
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How a probe ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "message", rename_all = "snake_case")]
pub enum PollOutcome {
    /// The status function returned normally
    Reported,

    /// The action was invalid, so it was not probed
    Skipped,

    /// The status function failed, panicked or timed out
    Failed(String),
}

/// Result of one probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollResult {
    /// Probed action
    pub identifier: String,

    /// Status message, `None` when there is nothing to report
    pub status: Option<String>,

    /// When the probe finished
    pub observed_at: DateTime<Utc>,

    /// How the probe ended
    pub outcome: PollOutcome,
}

/// What happened to a poll request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollRequest {
    /// A new probe was started
    Scheduled,

    /// A probe for this identifier is already running
    Coalesced,
}

/// Poller options
#[derive(Debug, Clone, Default)]
pub struct PollerOptions {
    /// Whether `trigger_all` also probes beta actions
    pub include_beta: bool,

    /// Upper bound for a single status call; unbounded when `None`
    pub probe_timeout: Option<Duration>,
}

struct PollerInner {
    registry: Arc<PluginRegistry>,
    options: PollerOptions,
    in_flight: Mutex<HashSet<String>>,
    idle: Notify,
    results: mpsc::UnboundedSender<PollResult>,
}

impl PollerInner {
    fn in_flight(&self) -> MutexGuard<'_, HashSet<String>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears the in-flight marker for an identifier when the probe ends, however
/// it ends
struct InFlight {
    inner: Arc<PollerInner>,
    identifier: String,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let mut in_flight = self.inner.in_flight();
        in_flight.remove(&self.identifier);
        if in_flight.is_empty() {
            self.inner.idle.notify_waiters();
        }
    }
}

/// Asynchronous status poller
#[derive(Clone)]
pub struct StatusPoller {
    inner: Arc<PollerInner>,
}

impl StatusPoller {
    /// Create a poller and the receiver its results are delivered on
    pub fn new(
        registry: Arc<PluginRegistry>,
        options: PollerOptions,
    ) -> (Self, mpsc::UnboundedReceiver<PollResult>) {
        let (results, receiver) = mpsc::unbounded_channel();
        let poller = Self {
            inner: Arc::new(PollerInner {
                registry,
                options,
                in_flight: Mutex::new(HashSet::new()),
                idle: Notify::new(),
                results,
            }),
        };
        (poller, receiver)
    }

    /// Schedule one probe for `identifier`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn poll(&self, identifier: &str) -> PollRequest {
        if !self.inner.in_flight().insert(identifier.to_string()) {
            debug!("Probe already in flight for {}; coalescing", identifier);
            return PollRequest::Coalesced;
        }

        let guard = InFlight {
            inner: Arc::clone(&self.inner),
            identifier: identifier.to_string(),
        };
        tokio::spawn(probe(guard));
        PollRequest::Scheduled
    }

    /// Re-poll one action right away, e.g. after it was run
    pub fn trigger(&self, identifier: &str) -> PollRequest {
        self.poll(identifier)
    }

    /// Re-poll every listed action. Returns the number of probes started.
    pub fn trigger_all(&self) -> usize {
        let mut started = 0;
        for identifier in self
            .inner
            .registry
            .identifiers(self.inner.options.include_beta)
        {
            if self.poll(&identifier) == PollRequest::Scheduled {
                started += 1;
            }
        }
        started
    }

    /// Number of probes currently running
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight().len()
    }

    /// Wait until no probe is running
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Poll every listed action each `interval` until `shutdown` resolves.
    ///
    /// The first round starts immediately. Intervals shorter than
    /// [`MIN_POLL_INTERVAL`] are raised to it.
    pub async fn run_periodic<F>(&self, interval: Duration, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        if interval < MIN_POLL_INTERVAL {
            warn!(
                "Poll interval {:?} is too short; using {:?}",
                interval, MIN_POLL_INTERVAL
            );
        }
        let interval = interval.max(MIN_POLL_INTERVAL);
        info!("Polling action status every {:?}", interval);
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let started = self.trigger_all();
                    debug!("Started {} status probe(s)", started);
                }
                _ = &mut shutdown => {
                    info!("Status polling stopped");
                    break;
                }
            }
        }
    }
}

async fn probe(guard: InFlight) {
    let inner = Arc::clone(&guard.inner);
    let identifier = guard.identifier.clone();

    // Only the snapshot lookup happens here; plugin code runs on the
    // blocking pool
    let action = match inner.registry.snapshot().get(&identifier).cloned() {
        Some(action) => action,
        None => {
            debug!("Action {} is no longer registered; skipping probe", identifier);
            return;
        }
    };

    let delay = action.status_probe_delay();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let mut task = tokio::task::spawn_blocking(move || {
        if evaluate_state(action.as_ref()).is_invalid() {
            return None;
        }
        Some(action.status())
    });

    let joined = match inner.options.probe_timeout {
        Some(limit) => tokio::time::timeout(limit, &mut task).await.ok(),
        None => Some((&mut task).await),
    };

    let timed_out = joined.is_none();
    let (status, outcome) = match joined {
        Some(joined) => probe_outcome(&identifier, joined),
        None => {
            warn!(
                "Status probe for {} timed out after {:?}",
                identifier, inner.options.probe_timeout
            );
            (None, PollOutcome::Failed("timed out".to_string()))
        }
    };

    let result = PollResult {
        identifier,
        status,
        observed_at: Utc::now(),
        outcome,
    };
    if inner.results.send(result).is_err() {
        debug!("Poll result receiver dropped");
    }

    // A timed out status call cannot be cancelled. The identifier stays in
    // flight until it returns so no second call can start next to it.
    if timed_out {
        let _ = task.await;
    }
    drop(guard);
}

/// Turn the outcome of the blocking status call into a poll result
fn probe_outcome(
    identifier: &str,
    joined: Result<Option<anyhow::Result<Option<String>>>, JoinError>,
) -> (Option<String>, PollOutcome) {
    match joined {
        Ok(None) => (None, PollOutcome::Skipped),
        Ok(Some(Ok(status))) => (
            status.filter(|s| !s.trim().is_empty()),
            PollOutcome::Reported,
        ),
        Ok(Some(Err(e))) => {
            warn!("Failed to get status for {}: {}", identifier, e);
            (None, PollOutcome::Failed(e.to_string()))
        }
        Err(e) => {
            warn!("Status probe for {} panicked: {}", identifier, e);
            (None, PollOutcome::Failed("status probe panicked".to_string()))
        }
    }
}
