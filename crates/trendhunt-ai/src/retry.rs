//! Retry with exponential back-off and jitter for AI provider calls.
//!
//! [`retry_with_backoff`] wraps any fallible async operation and retries on
//! transient errors (network failures, 429, 5xx). Auth failures, malformed
//! requests and the local budget errors are returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::AiError;

/// Retry settings shared by every call made through an [`crate::AiClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure. `0` disables retries.
    pub max_retries: u32,
    /// Base delay for the back-off schedule, in milliseconds.
    pub backoff_base_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base_ms: 1_000,
        }
    }
}

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:**
/// - Network-level failures: timeout, connection reset.
/// - [`AiError::RateLimited`]: the provider asked us to back off.
/// - HTTP 5xx responses.
///
/// **Not retriable:**
/// - [`AiError::Auth`] and 4xx [`AiError::UnexpectedStatus`]: retrying sends
///   the same bad request.
/// - [`AiError::Deserialize`], [`AiError::EmptyResponse`], [`AiError::Parse`].
/// - [`AiError::RateLimitExceeded`] and [`AiError::BudgetExhausted`]: the
///   local budget is spent; retrying would only spend more.
pub(crate) fn is_retriable(err: &AiError) -> bool {
    match err {
        AiError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        AiError::RateLimited { .. } => true,
        AiError::UnexpectedStatus { status, .. } => *status >= 500,
        AiError::Auth { .. }
        | AiError::Deserialize { .. }
        | AiError::EmptyResponse { .. }
        | AiError::Parse(_)
        | AiError::RateLimitExceeded { .. }
        | AiError::BudgetExhausted { .. }
        | AiError::InvalidConfig(_) => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// Back-off schedule with `backoff_base_ms = 1_000`:
///
/// | Attempt | Sleep before next attempt        |
/// |---------|----------------------------------|
/// | 1       | 1 000 ms × 2⁰ ± 25 % jitter     |
/// | 2       | 1 000 ms × 2¹ ± 25 % jitter     |
/// | 3       | 1 000 ms × 2² ± 25 % jitter     |
///
/// A `Retry-After` hint on a 429 raises the delay to at least that long.
/// Delay is capped at 60 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, AiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AiError>>,
{
    const MAX_DELAY_MS: u64 = 60_000;
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let hinted = match &err {
                    AiError::RateLimited {
                        retry_after_secs: Some(secs),
                        ..
                    } => secs.saturating_mul(1_000),
                    _ => 0,
                };
                let capped = computed.max(hinted).min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient AI provider error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
