//! Retry logic with exponential backoff for transient errors.

use crate::error::{Error, Result};
use crate::types::RetryConfig;
use std::thread;

/// Observer notified before each retry sleep.
pub trait RetryCallback: Sync {
    /// `attempt` is the 1-indexed attempt that just failed with `error`;
    /// the next one starts after `delay_ms`.
    fn on_retry(&self, attempt: u32, max_attempts: u32, error: &Error, delay_ms: u64);
}

/// Reports retries through the `log` facade.
pub struct LogCallback;

impl RetryCallback for LogCallback {
    fn on_retry(&self, attempt: u32, max_attempts: u32, error: &Error, delay_ms: u64) {
        log::warn!(
            "{} (attempt {}/{}), retrying in {}ms",
            error,
            attempt,
            max_attempts,
            delay_ms
        );
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// `config.max_attempts` is used up.
///
/// Only throttling and network errors are retried. The error of the last
/// attempt is returned when every attempt fails.
pub fn with_retry<T, F>(
    config: &RetryConfig,
    callback: Option<&dyn RetryCallback>,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let mut attempt = 0;
    loop {
        let err = match operation() {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };
        attempt += 1;
        if !err.is_retryable() || attempt >= config.max_attempts {
            return Err(err);
        }

        let delay = config.delay_for_attempt(attempt - 1);
        if let Some(cb) = callback {
            let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
            cb.on_retry(attempt, config.max_attempts, &err, delay_ms);
        }
        thread::sleep(delay);
    }
}
