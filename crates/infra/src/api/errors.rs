//! Engine-specific error types
//!
//! Provides the terminal error taxonomy for settlement operations with
//! retry metadata for callers that re-run the whole higher-level action.

use std::time::Duration;

use strato_domain::StratoError;
use thiserror::Error;

use super::envelope::EnvelopeError;

/// Categories of settlement errors for caller-side retry logic
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationErrorCategory {
    /// Transport-level failures - the request never produced a response
    Transport,
    /// The remote system rejected the operation outright
    Remote,
    /// The response did not have the expected shape
    Protocol,
    /// The wall-clock budget ran out while the operation was still settling
    Budget,
    /// The resource reached a lifecycle state outside the recognized sets
    State,
    /// The caller cancelled, or the policy itself was invalid
    Config,
}

/// Terminal errors produced by the settlement engine
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("transport failure: {0}")]
    Transport(#[source] StratoError),

    #[error("{kind}: {message}")]
    Remote { kind: String, message: String },

    #[error("got status {status} but failed to parse error body: {source}")]
    UnparsableErrorBody {
        status: u16,
        #[source]
        source: EnvelopeError,
    },

    #[error("response shape mismatch: {0}")]
    Shape(String),

    #[error("operation did not settle within {budget:?}; last reason: {last}")]
    Timeout { budget: Duration, last: String },

    #[error("resource reached unexpected state {state:?}")]
    UnexpectedState { state: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("invalid policy: {0}")]
    Policy(String),
}

impl OperationError {
    /// Get the error category for this error
    pub fn category(&self) -> OperationErrorCategory {
        match self {
            Self::Transport(_) => OperationErrorCategory::Transport,
            Self::Remote { .. } => OperationErrorCategory::Remote,
            Self::Shape(_) | Self::UnparsableErrorBody { .. } => OperationErrorCategory::Protocol,
            Self::Timeout { .. } => OperationErrorCategory::Budget,
            Self::UnexpectedState { .. } => OperationErrorCategory::State,
            Self::Cancelled | Self::Policy(_) => OperationErrorCategory::Config,
        }
    }

    /// Whether re-running the whole operation may help.
    ///
    /// Every error here is terminal for the current call; this classifies
    /// which of them are plausibly transient from the caller's point of view.
    pub fn should_retry(&self) -> bool {
        matches!(
            self.category(),
            OperationErrorCategory::Transport | OperationErrorCategory::Budget
        )
    }
}
