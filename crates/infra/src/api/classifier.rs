//! Status-outcome classification
//!
//! Turns one attempt's outcome into a terminal verdict: settle, retry, or
//! fail. The classifier is pure decision logic; the retry and poll loops own
//! every wait, so a cancelled caller is never blocked inside a classification.

use std::collections::HashSet;
use std::time::Duration;

use reqwest::StatusCode;
use strato_domain::{RetryTuning, StratoError};

use super::envelope::extract_error_message;
use super::errors::OperationError;
use super::response::RawResponse;

/// Default wall-clock budget for a single mutating operation.
pub const DEFAULT_OPERATION_BUDGET: Duration = Duration::from_secs(300);

/// Per-call-site retry policy: which statuses settle an operation, which are
/// worth another attempt, and how much wall-clock/delay to spend.
///
/// Any status outside both sets is fatal, so the policy need not be
/// exhaustive.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    stop_codes: HashSet<StatusCode>,
    retry_codes: HashSet<StatusCode>,
    timeout: Duration,
    delay: Duration,
}

impl RetryPolicy {
    /// Build a policy, validating that the stop and retry sets are disjoint.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Policy`] when a status appears in both sets.
    pub fn new(
        stop_codes: impl IntoIterator<Item = StatusCode>,
        retry_codes: impl IntoIterator<Item = StatusCode>,
        timeout: Duration,
        delay: Duration,
    ) -> Result<Self, OperationError> {
        let stop_codes: HashSet<StatusCode> = stop_codes.into_iter().collect();
        let retry_codes: HashSet<StatusCode> = retry_codes.into_iter().collect();

        if let Some(code) = stop_codes.intersection(&retry_codes).next() {
            return Err(OperationError::Policy(format!(
                "status {code} is both a stop code and a retry code"
            )));
        }

        Ok(Self { stop_codes, retry_codes, timeout, delay })
    }

    /// Default policy for create operations.
    ///
    /// Conflict, failed-dependency, and accepted responses are transient;
    /// 2xx settlement statuses and Forbidden are terminal.
    pub fn create_defaults(tuning: &RetryTuning) -> Self {
        Self {
            stop_codes: [
                StatusCode::NO_CONTENT,
                StatusCode::CREATED,
                StatusCode::OK,
                StatusCode::FORBIDDEN,
            ]
            .into_iter()
            .collect(),
            retry_codes: [StatusCode::CONFLICT, StatusCode::FAILED_DEPENDENCY, StatusCode::ACCEPTED]
                .into_iter()
                .collect(),
            timeout: DEFAULT_OPERATION_BUDGET,
            delay: tuning.attempt_delay,
        }
    }

    /// Default policy for delete operations.
    ///
    /// BadRequest is a stop condition here on purpose: a delete the server
    /// rejects outright is not worth retrying.
    pub fn delete_defaults(tuning: &RetryTuning) -> Self {
        Self {
            stop_codes: [StatusCode::NO_CONTENT, StatusCode::CREATED, StatusCode::BAD_REQUEST]
                .into_iter()
                .collect(),
            retry_codes: [StatusCode::CONFLICT, StatusCode::FAILED_DEPENDENCY]
                .into_iter()
                .collect(),
            timeout: DEFAULT_OPERATION_BUDGET,
            delay: tuning.attempt_delay,
        }
    }

    /// Override the wall-clock budget.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the inter-attempt delay.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Statuses that settle the operation.
    pub fn stop_codes(&self) -> &HashSet<StatusCode> {
        &self.stop_codes
    }

    /// Statuses worth another attempt.
    pub fn retry_codes(&self) -> &HashSet<StatusCode> {
        &self.retry_codes
    }

    /// Wall-clock budget, measured from the first attempt.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Wait between attempts.
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

/// Verdict for one attempt
#[derive(Debug)]
pub enum Verdict {
    /// Terminal success; the operation settled with this response.
    Settled(RawResponse),
    /// Transient failure; worth another attempt after the policy delay.
    Retry {
        /// Extracted remote message, carried into a later timeout diagnosis.
        reason: String,
    },
    /// Terminal failure.
    Fail(OperationError),
}

/// Classify one attempt's outcome against a policy.
///
/// Transport errors are never retried here: the request may have had side
/// effects, and re-issuing it is a decision for the caller. A status in the
/// stop set settles the operation. Anything else must carry a decodable error
/// envelope; a body that fails to decode turns a genuine remote failure into
/// an [`OperationError::UnparsableErrorBody`], which is the surfaced error.
pub fn classify(outcome: Result<RawResponse, StratoError>, policy: &RetryPolicy) -> Verdict {
    let response = match outcome {
        Err(err) => return Verdict::Fail(OperationError::Transport(err)),
        Ok(response) => response,
    };

    let status = response.status();
    if policy.stop_codes.contains(&status) {
        return Verdict::Settled(response);
    }

    let extracted = match extract_error_message(response.body()) {
        Ok(extracted) => extracted,
        Err(err) => {
            return Verdict::Fail(OperationError::UnparsableErrorBody {
                status: status.as_u16(),
                source: err,
            })
        }
    };

    if policy.retry_codes.contains(&status) {
        Verdict::Retry { reason: extracted.message }
    } else {
        Verdict::Fail(OperationError::Remote { kind: extracted.kind, message: extracted.message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conflict_body() -> Vec<u8> {
        br#"{"Errors":[{"Type":"Conflict","Details":"resource busy"}],"ResponseContext":{"RequestId":"req-1"}}"#
            .to_vec()
    }

    fn policy() -> RetryPolicy {
        RetryPolicy::new(
            [StatusCode::CREATED],
            [StatusCode::CONFLICT],
            Duration::from_secs(5),
            Duration::from_millis(10),
        )
        .unwrap()
    }

    #[test]
    fn transport_error_fails_immediately() {
        let verdict = classify(Err(StratoError::Network("connection reset".into())), &policy());
        match verdict {
            Verdict::Fail(OperationError::Transport(_)) => {}
            other => panic!("expected transport failure, got {:?}", other),
        }
    }

    #[test]
    fn stop_code_settles_without_reading_the_body() {
        let response = RawResponse::new(StatusCode::CREATED, b"not an envelope".to_vec());
        match classify(Ok(response), &policy()) {
            Verdict::Settled(settled) => assert_eq!(settled.status(), StatusCode::CREATED),
            other => panic!("expected settled, got {:?}", other),
        }
    }

    #[test]
    fn retry_code_carries_the_extracted_message() {
        let response = RawResponse::new(StatusCode::CONFLICT, conflict_body());
        match classify(Ok(response), &policy()) {
            Verdict::Retry { reason } => assert_eq!(reason, "resource busy"),
            other => panic!("expected retry, got {:?}", other),
        }
    }

    #[test]
    fn unknown_status_is_a_fatal_remote_failure() {
        let body = br#"{"Errors":[{"Type":"Quota","Details":"limit reached"}]}"#.to_vec();
        let response = RawResponse::new(StatusCode::PAYMENT_REQUIRED, body);
        match classify(Ok(response), &policy()) {
            Verdict::Fail(OperationError::Remote { kind, message }) => {
                assert_eq!(kind, "Quota");
                assert_eq!(message, "limit reached");
            }
            other => panic!("expected remote failure, got {:?}", other),
        }
    }

    #[test]
    fn unparsable_error_body_names_the_status() {
        let response = RawResponse::new(StatusCode::CONFLICT, b"<html>oops</html>".to_vec());
        match classify(Ok(response), &policy()) {
            Verdict::Fail(OperationError::UnparsableErrorBody { status, .. }) => {
                assert_eq!(status, 409);
            }
            other => panic!("expected unparsable body failure, got {:?}", other),
        }
    }

    #[test]
    fn overlapping_sets_are_rejected() {
        let result = RetryPolicy::new(
            [StatusCode::CONFLICT],
            [StatusCode::CONFLICT],
            Duration::from_secs(5),
            Duration::from_millis(10),
        );
        assert!(matches!(result, Err(OperationError::Policy(_))));
    }

    #[test]
    fn default_policies_are_internally_consistent() {
        let tuning = RetryTuning::default();
        for policy in [RetryPolicy::create_defaults(&tuning), RetryPolicy::delete_defaults(&tuning)]
        {
            assert!(policy.stop_codes().is_disjoint(policy.retry_codes()));
            assert_eq!(policy.delay(), tuning.attempt_delay);
            assert_eq!(policy.timeout(), DEFAULT_OPERATION_BUDGET);
        }
    }

    #[test]
    fn delete_defaults_stop_on_bad_request() {
        let policy = RetryPolicy::delete_defaults(&RetryTuning::default());
        assert!(policy.stop_codes().contains(&StatusCode::BAD_REQUEST));
        assert!(!policy.retry_codes().contains(&StatusCode::BAD_REQUEST));
    }
}
