//! Configuration loading for the settlement engine.

mod loader;

pub use loader::{load_retry_tuning, RETRY_DELAY_ENV};
