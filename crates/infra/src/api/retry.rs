//! Bounded-time retry of mutating control-plane operations
//!
//! One core loop drives a caller-supplied remote-call closure until the
//! status classifier settles it, fails it, or the wall-clock budget runs out.
//! The create/update/delete entry points are thin shapes over that loop that
//! only differ in which identifiers and body they hand to the closure.

use std::future::Future;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use strato_domain::StratoError;

use super::classifier::{classify, RetryPolicy, Verdict};
use super::errors::OperationError;
use super::response::RawResponse;

/// Drives a single mutating operation to a terminal outcome.
///
/// Holds only the policy; every invocation is independent and keeps its
/// elapsed time and last response on its own stack, so concurrent retriers
/// never interfere.
#[derive(Debug, Clone)]
pub struct OperationRetrier {
    policy: RetryPolicy,
}

impl OperationRetrier {
    /// Create a retrier with the given policy.
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// The policy this retrier applies.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Retry a bodyless create until it settles.
    ///
    /// # Errors
    ///
    /// Returns the terminal [`OperationError`] when the operation fails,
    /// times out, or is cancelled.
    #[instrument(skip(self, cancel, call), fields(scope = %scope_id))]
    pub async fn create<F, Fut>(
        &self,
        cancel: &CancellationToken,
        scope_id: &str,
        mut call: F,
    ) -> Result<RawResponse, OperationError>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<RawResponse, StratoError>>,
    {
        self.drive(cancel, || call(scope_id.to_owned())).await
    }

    /// Retry a create carrying a request body until it settles.
    ///
    /// # Errors
    ///
    /// Returns the terminal [`OperationError`] when the operation fails,
    /// times out, or is cancelled.
    #[instrument(skip(self, cancel, body, call), fields(scope = %scope_id))]
    pub async fn create_with_body<B, F, Fut>(
        &self,
        cancel: &CancellationToken,
        scope_id: &str,
        body: &B,
        mut call: F,
    ) -> Result<RawResponse, OperationError>
    where
        B: Clone,
        F: FnMut(String, B) -> Fut,
        Fut: Future<Output = Result<RawResponse, StratoError>>,
    {
        self.drive(cancel, || call(scope_id.to_owned(), body.clone())).await
    }

    /// Retry an update of an existing resource until it settles.
    ///
    /// # Errors
    ///
    /// Returns the terminal [`OperationError`] when the operation fails,
    /// times out, or is cancelled.
    #[instrument(skip(self, cancel, body, call), fields(scope = %scope_id, resource = %resource_id))]
    pub async fn update_with_body<B, F, Fut>(
        &self,
        cancel: &CancellationToken,
        scope_id: &str,
        resource_id: &str,
        body: &B,
        mut call: F,
    ) -> Result<RawResponse, OperationError>
    where
        B: Clone,
        F: FnMut(String, String, B) -> Fut,
        Fut: Future<Output = Result<RawResponse, StratoError>>,
    {
        self.drive(cancel, || call(scope_id.to_owned(), resource_id.to_owned(), body.clone()))
            .await
    }

    /// Retry a delete until it settles. The final response carries no payload
    /// a caller could use, so only the error channel is surfaced.
    ///
    /// # Errors
    ///
    /// Returns the terminal [`OperationError`] when the operation fails,
    /// times out, or is cancelled.
    #[instrument(skip(self, cancel, call), fields(scope = %scope_id, resource = %resource_id))]
    pub async fn delete<F, Fut>(
        &self,
        cancel: &CancellationToken,
        scope_id: &str,
        resource_id: &str,
        mut call: F,
    ) -> Result<(), OperationError>
    where
        F: FnMut(String, String) -> Fut,
        Fut: Future<Output = Result<RawResponse, StratoError>>,
    {
        self.drive(cancel, || call(scope_id.to_owned(), resource_id.to_owned())).await.map(|_| ())
    }

    /// Retry a delete that carries a request body until it settles.
    ///
    /// # Errors
    ///
    /// Returns the terminal [`OperationError`] when the operation fails,
    /// times out, or is cancelled.
    #[instrument(skip(self, cancel, body, call), fields(scope = %scope_id, resource = %resource_id))]
    pub async fn delete_with_body<B, F, Fut>(
        &self,
        cancel: &CancellationToken,
        scope_id: &str,
        resource_id: &str,
        body: &B,
        mut call: F,
    ) -> Result<RawResponse, OperationError>
    where
        B: Clone,
        F: FnMut(String, String, B) -> Fut,
        Fut: Future<Output = Result<RawResponse, StratoError>>,
    {
        self.drive(cancel, || call(scope_id.to_owned(), resource_id.to_owned(), body.clone()))
            .await
    }

    /// Core loop: attempt, classify, wait, repeat.
    ///
    /// The wall-clock budget is measured from the first attempt. Both the
    /// in-flight call and the inter-attempt delay race the cancellation
    /// token, so a cancelled caller is released promptly instead of blocking
    /// out a full delay period.
    async fn drive<F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut call: F,
    ) -> Result<RawResponse, OperationError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<RawResponse, StratoError>>,
    {
        let started = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let outcome = tokio::select! {
                () = cancel.cancelled() => return Err(OperationError::Cancelled),
                outcome = call() => outcome,
            };

            match classify(outcome, &self.policy) {
                Verdict::Settled(response) => {
                    debug!(attempt, status = %response.status(), "operation settled");
                    return Ok(response);
                }
                Verdict::Fail(err) => {
                    warn!(attempt, error = %err, "operation failed");
                    return Err(err);
                }
                Verdict::Retry { reason } => {
                    if started.elapsed() >= self.policy.timeout() {
                        warn!(attempt, reason = %reason, "settlement budget exhausted");
                        return Err(OperationError::Timeout {
                            budget: self.policy.timeout(),
                            last: reason,
                        });
                    }

                    debug!(
                        attempt,
                        reason = %reason,
                        delay = ?self.policy.delay(),
                        "operation still settling"
                    );

                    tokio::select! {
                        () = cancel.cancelled() => return Err(OperationError::Cancelled),
                        () = tokio::time::sleep(self.policy.delay()) => {}
                    }
                }
            }
        }
    }
}
