//! Engine tuning loader
//!
//! Reads the single external tunable, the inter-attempt delay, from the
//! process environment into an explicit [`RetryTuning`] value. Callers load
//! once at bootstrap and pass the struct down, so tests and concurrent call
//! sites can use different tunings without touching shared process state.
//!
//! ## Environment Variables
//! - `STRATO_RETRY_DELAY`: delay between attempts, in whole seconds

use std::time::Duration;

use strato_domain::RetryTuning;

/// Environment variable naming the inter-attempt delay, in whole seconds.
pub const RETRY_DELAY_ENV: &str = "STRATO_RETRY_DELAY";

/// Load engine tuning from the process environment.
///
/// An absent or unparsable value falls back to the default delay rather than
/// failing: a misconfigured tunable should never take the client down.
pub fn load_retry_tuning() -> RetryTuning {
    match std::env::var(RETRY_DELAY_ENV) {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(secs) => RetryTuning::with_attempt_delay(Duration::from_secs(secs)),
            Err(err) => {
                tracing::warn!(
                    value = %raw,
                    error = %err,
                    "ignoring unparsable {RETRY_DELAY_ENV}, using default delay"
                );
                RetryTuning::default()
            }
        },
        Err(_) => RetryTuning::default(),
    }
}
