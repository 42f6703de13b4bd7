//! Retry utilities for Apify API calls.
//!
//! Provides exponential backoff retry logic for transient HTTP errors such as
//! 429 responses and 5xx statuses. Non-retriable errors (bad token, parse
//! failures, failed actor runs) are propagated immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::ApifyError;

/// Returns `true` if `err` represents a transient condition that should be
/// retried after a backoff delay.
///
/// Retriable errors:
/// - [`ApifyError::RateLimited`]: HTTP 429; Apify has asked us to back off.
/// - [`ApifyError::Http`]: network-level failure (connection reset, timeout).
/// - [`ApifyError::UnexpectedStatus`] with a 5xx status.
///
/// Everything else is returned to the caller on the first failure.
fn is_retriable(err: &ApifyError) -> bool {
    match err {
        ApifyError::RateLimited { .. } | ApifyError::Http(_) => true,
        ApifyError::UnexpectedStatus { status, .. } => *status >= 500,
        _ => false,
    }
}

/// Executes `operation` with exponential backoff retries on transient errors.
///
/// The wait before the n-th retry is `backoff_base_secs * 2^(n-1)` seconds,
/// raised to the server's `Retry-After` hint on 429. With `max_retries = 3`
/// the operation is attempted at most 4 times total.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, ApifyError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApifyError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if !is_retriable(&err) || attempt >= max_retries => return Err(err),
            Err(err) => err,
        };

        let computed = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
        let delay_secs = match &err {
            ApifyError::RateLimited { retry_after_secs } => computed.max(*retry_after_secs),
            _ => computed,
        };
        // Up to 250 ms of jitter so parallel runs do not retry in lockstep.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let jitter_ms = (rand::random::<f64>() * 250.0) as u64;
        tracing::warn!(
            attempt,
            max_retries,
            delay_secs,
            error = %err,
            "transient Apify error, retrying after backoff"
        );
        tokio::time::sleep(Duration::from_secs(delay_secs) + Duration::from_millis(jitter_ms))
            .await;
        attempt += 1;
    }
}
