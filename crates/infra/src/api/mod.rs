//! Settlement engine for Strato control-plane operations
//!
//! The control plane acknowledges create/update/delete requests before the
//! underlying resource has settled: a request may bounce with a transient
//! conflict status for a while, and a created resource passes through
//! intermediate lifecycle states before it is usable. This module drives such
//! operations to a deterministic terminal outcome:
//!
//! - `classifier`: turns one attempt's outcome into a settle/retry/fail verdict
//! - `retry`: repeats a single mutating call until its status settles, within
//!   a wall-clock budget
//! - `poll`: repeats a read until the observed lifecycle state reaches a
//!   target set, within a wall-clock budget
//! - `response`/`envelope`: uniform access to status, body, decoded payload,
//!   and remote error messages across heterogeneous response shapes
//!
//! Transport is injected: every loop drives a caller-supplied async closure
//! and aborts it promptly on cancellation. All waits are cancellation-aware.

pub mod classifier;
pub mod envelope;
pub mod errors;
pub mod poll;
pub mod response;
pub mod retry;

pub use classifier::{classify, RetryPolicy, Verdict, DEFAULT_OPERATION_BUDGET};
pub use envelope::{extract_error_message, EnvelopeError, ExtractedError};
pub use errors::{OperationError, OperationErrorCategory};
pub use poll::{PollPolicy, StatePoller, DEFAULT_RESOURCE_BUDGET, DEFAULT_STATUS_BUDGET};
pub use response::{LifecycleState, RawResponse};
pub use retry::OperationRetrier;
