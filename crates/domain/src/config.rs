//! Client-side tuning configuration
//!
//! Plain configuration structures with sensible defaults. Loading from the
//! process environment lives on the infrastructure side; callers construct
//! these explicitly so concurrent call sites and tests can use different
//! values without touching shared process state.

use std::time::Duration;

/// Default wait between attempts while an operation settles.
pub const DEFAULT_ATTEMPT_DELAY: Duration = Duration::from_secs(5);

/// Tuning knobs for the settlement engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryTuning {
    /// Wait between attempts while a remote operation or resource settles.
    pub attempt_delay: Duration,
}

impl Default for RetryTuning {
    fn default() -> Self {
        Self { attempt_delay: DEFAULT_ATTEMPT_DELAY }
    }
}

impl RetryTuning {
    /// Tuning with an explicit inter-attempt delay.
    pub fn with_attempt_delay(attempt_delay: Duration) -> Self {
        Self { attempt_delay }
    }
}
