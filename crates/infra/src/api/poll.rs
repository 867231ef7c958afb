//! Lifecycle-state polling
//!
//! A settled create/update only means the control plane accepted the request;
//! the resource itself still moves through intermediate lifecycle states
//! before it is usable. The poller repeats a read until the observed state
//! leaves the pending set for a target state, failing fast on anything it
//! does not recognize.

use std::collections::HashSet;
use std::future::Future;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use strato_domain::{RetryTuning, StratoError};

use super::envelope::extract_error_message;
use super::errors::OperationError;
use super::response::{LifecycleState, RawResponse};

/// Default wall-clock budget for resources exposing a flat state field.
pub const DEFAULT_RESOURCE_BUDGET: Duration = Duration::from_secs(300);

/// Default wall-clock budget for resources exposing a nested status state.
/// These kinds (clusters and their children) settle noticeably slower.
pub const DEFAULT_STATUS_BUDGET: Duration = Duration::from_secs(900);

/// Per-call-site poll policy: which observed states mean "still settling",
/// which mean "done", and how much wall-clock/delay to spend.
///
/// Any observed state outside both sets is a terminal failure, not a retry.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    pending_states: HashSet<String>,
    target_states: HashSet<String>,
    timeout: Duration,
    delay: Duration,
}

impl PollPolicy {
    /// Build a policy, validating that the state sets are disjoint and that
    /// the budget leaves room for at least one re-read.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Policy`] when a state appears in both sets
    /// or the timeout does not exceed the delay.
    pub fn new(
        pending_states: impl IntoIterator<Item = impl Into<String>>,
        target_states: impl IntoIterator<Item = impl Into<String>>,
        timeout: Duration,
        delay: Duration,
    ) -> Result<Self, OperationError> {
        let pending_states: HashSet<String> =
            pending_states.into_iter().map(Into::into).collect();
        let target_states: HashSet<String> = target_states.into_iter().map(Into::into).collect();

        if let Some(state) = pending_states.intersection(&target_states).next() {
            return Err(OperationError::Policy(format!(
                "state {state:?} is both pending and target"
            )));
        }
        if timeout <= delay {
            return Err(OperationError::Policy(format!(
                "timeout {timeout:?} must exceed the poll delay {delay:?}"
            )));
        }

        Ok(Self { pending_states, target_states, timeout, delay })
    }

    /// Default policy for resources exposing a flat state field (5 min).
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Policy`] when the given sets overlap.
    pub fn resource_defaults(
        pending_states: impl IntoIterator<Item = impl Into<String>>,
        target_states: impl IntoIterator<Item = impl Into<String>>,
        tuning: &RetryTuning,
    ) -> Result<Self, OperationError> {
        Self::new(pending_states, target_states, DEFAULT_RESOURCE_BUDGET, tuning.attempt_delay)
    }

    /// Default policy for resources exposing a nested status state (15 min).
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Policy`] when the given sets overlap.
    pub fn status_defaults(
        pending_states: impl IntoIterator<Item = impl Into<String>>,
        target_states: impl IntoIterator<Item = impl Into<String>>,
        tuning: &RetryTuning,
    ) -> Result<Self, OperationError> {
        Self::new(pending_states, target_states, DEFAULT_STATUS_BUDGET, tuning.attempt_delay)
    }

    /// Override the wall-clock budget.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the inter-read delay.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// States that mean the resource is still settling.
    pub fn pending_states(&self) -> &HashSet<String> {
        &self.pending_states
    }

    /// States that mean the resource is usable.
    pub fn target_states(&self) -> &HashSet<String> {
        &self.target_states
    }

    /// Wall-clock budget, measured from the first read.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Wait between reads.
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

/// Waits for a resource's lifecycle state to reach a target set.
///
/// Holds only the policy; all loop state is local to one invocation, so
/// concurrent pollers on different resources never interfere.
#[derive(Debug, Clone)]
pub struct StatePoller {
    policy: PollPolicy,
}

impl StatePoller {
    /// Create a poller with the given policy.
    pub fn new(policy: PollPolicy) -> Self {
        Self { policy }
    }

    /// The policy this poller applies.
    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Poll a single-identifier read until the observed state is a target.
    ///
    /// # Errors
    ///
    /// Returns the terminal [`OperationError`] on read failure, unexpected
    /// state, budget exhaustion, or cancellation.
    #[instrument(skip(self, cancel, read), fields(scope = %scope_id, resource = %resource_id))]
    pub async fn wait_for_state<P, F, Fut>(
        &self,
        cancel: &CancellationToken,
        scope_id: &str,
        resource_id: &str,
        mut read: F,
    ) -> Result<P, OperationError>
    where
        P: DeserializeOwned + LifecycleState,
        F: FnMut(String, String) -> Fut,
        Fut: Future<Output = Result<RawResponse, StratoError>>,
    {
        self.poll(cancel, || read(scope_id.to_owned(), resource_id.to_owned())).await
    }

    /// Poll a parent/child-identifier read until the observed state is a
    /// target. Used for resources addressed through their owner, like nodes
    /// of a cluster.
    ///
    /// # Errors
    ///
    /// Returns the terminal [`OperationError`] on read failure, unexpected
    /// state, budget exhaustion, or cancellation.
    #[instrument(
        skip(self, cancel, read),
        fields(scope = %scope_id, parent = %parent_id, child = %child_id)
    )]
    pub async fn wait_for_state_with_parent<P, F, Fut>(
        &self,
        cancel: &CancellationToken,
        scope_id: &str,
        parent_id: &str,
        child_id: &str,
        mut read: F,
    ) -> Result<P, OperationError>
    where
        P: DeserializeOwned + LifecycleState,
        F: FnMut(String, String, String) -> Fut,
        Fut: Future<Output = Result<RawResponse, StratoError>>,
    {
        self.poll(cancel, || {
            read(scope_id.to_owned(), parent_id.to_owned(), child_id.to_owned())
        })
        .await
    }

    /// Core loop: read immediately, classify the observed state, wait,
    /// repeat.
    ///
    /// Read failures are not retried here: a transport error, a non-success
    /// status, or a payload without the expected state field ends the poll at
    /// once. An observed state outside both sets also fails immediately
    /// rather than waiting out the budget.
    async fn poll<P, F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut read: F,
    ) -> Result<P, OperationError>
    where
        P: DeserializeOwned + LifecycleState,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<RawResponse, StratoError>>,
    {
        let started = Instant::now();
        let mut reads: u32 = 0;

        loop {
            reads += 1;

            let response = tokio::select! {
                () = cancel.cancelled() => return Err(OperationError::Cancelled),
                outcome = read() => outcome.map_err(OperationError::Transport)?,
            };

            let status = response.status();
            if !status.is_success() {
                warn!(reads, %status, "read failed while polling");
                return Err(match extract_error_message(response.body()) {
                    Ok(extracted) => OperationError::Remote {
                        kind: extracted.kind,
                        message: extracted.message,
                    },
                    Err(err) => OperationError::UnparsableErrorBody {
                        status: status.as_u16(),
                        source: err,
                    },
                });
            }

            let payload: P = response.json()?;
            let state = match payload.lifecycle_state() {
                Some(state) => state.to_owned(),
                None => {
                    return Err(OperationError::Shape(
                        "decoded payload does not expose a lifecycle state".into(),
                    ))
                }
            };

            if self.policy.target_states.contains(&state) {
                debug!(reads, state = %state, "resource reached target state");
                return Ok(payload);
            }
            if !self.policy.pending_states.contains(&state) {
                warn!(reads, state = %state, "resource reached unexpected state");
                return Err(OperationError::UnexpectedState { state });
            }
            if started.elapsed() >= self.policy.timeout {
                warn!(reads, state = %state, "poll budget exhausted");
                return Err(OperationError::Timeout { budget: self.policy.timeout, last: state });
            }

            debug!(reads, state = %state, delay = ?self.policy.delay, "resource still settling");

            tokio::select! {
                () = cancel.cancelled() => return Err(OperationError::Cancelled),
                () = tokio::time::sleep(self.policy.delay) => {}
            }
        }
    }
}
