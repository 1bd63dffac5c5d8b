//! Retry policy with capped exponential backoff
//!
//! Used by the fal.ai, Notion and payment clients for transient upstream
//! failures, and by the Coral mention loop between failed waits.

use crate::config::RetryConfig;
use crate::error::AppResult;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Default maximum number of attempts
pub const DEFAULT_MAX_RETRIES: usize = 3;
/// Default base backoff in milliseconds (doubles each retry)
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 100;
/// Maximum backoff duration in milliseconds (30 seconds)
///
/// With base=100ms attempt 9 sleeps 25.6s and attempt 10 is capped.
pub const MAX_BACKOFF_MS: u64 = 30_000;

/// Attempts and base backoff for one retried operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (at least 1)
    max_retries: usize,
    /// Base backoff in milliseconds
    retry_backoff_ms: u64,
}

impl RetryPolicy {
    /// Create a new retry policy
    ///
    /// # Errors
    /// Returns an error if `max_retries` is 0 (at least 1 attempt is required)
    pub fn new(max_retries: usize, retry_backoff_ms: u64) -> Result<Self, &'static str> {
        if max_retries == 0 {
            return Err("max_retries must be at least 1");
        }
        Ok(Self {
            max_retries,
            retry_backoff_ms,
        })
    }

    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    pub fn retry_backoff_ms(&self) -> u64 {
        self.retry_backoff_ms
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        // Config::validate() rejects max_retries == 0; clamp anyway
        Self {
            max_retries: config.max_retries().max(1),
            retry_backoff_ms: config.retry_backoff_ms(),
        }
    }
}

/// Calculate exponential backoff with overflow protection
///
/// `base * 2^(attempt-1)`, capped at [`MAX_BACKOFF_MS`]. Attempt numbers are
/// 1-indexed; attempt 0 is treated as 1.
///
/// With base=100ms: 100, 200, 400, ... 30,000 (capped).
pub fn calculate_backoff(policy: &RetryPolicy, attempt: usize) -> u64 {
    let exponent = u32::try_from(attempt).unwrap_or(u32::MAX).saturating_sub(1);
    policy
        .retry_backoff_ms
        .saturating_mul(2_u64.saturating_pow(exponent))
        .min(MAX_BACKOFF_MS)
}

/// Backoff plus up to 25% random jitter, still capped at [`MAX_BACKOFF_MS`]
pub fn backoff_with_jitter(policy: &RetryPolicy, attempt: usize) -> u64 {
    let base = calculate_backoff(policy, attempt);
    let spread = base / 4;
    if spread == 0 {
        return base;
    }
    let jitter = rand::rng().random_range(0..=spread);
    base.saturating_add(jitter).min(MAX_BACKOFF_MS)
}

/// Run `operation` until it succeeds, fails permanently, or attempts run out
///
/// Only errors for which [`AppError::is_retryable`](crate::error::AppError::is_retryable)
/// holds are retried. The closure receives the 1-indexed attempt number.
///
/// # Errors
///
/// Returns the first non-retryable error, or the last error once
/// `max_retries` attempts have failed.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &'static str,
    mut call: F,
) -> AppResult<T>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempt = 1;
    loop {
        match call(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(operation, attempt, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if e.is_retryable() && attempt < policy.max_retries() => {
                let backoff_ms = calculate_backoff(policy, attempt);
                tracing::warn!(
                    operation,
                    attempt,
                    max_retries = policy.max_retries(),
                    backoff_ms,
                    error = %e,
                    "Retryable upstream failure, backing off"
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::error!(
                    operation,
                    attempt,
                    max_retries = policy.max_retries(),
                    retryable = e.is_retryable(),
                    error = %e,
                    "Operation failed"
                );
                return Err(e);
            }
        }
    }
}
