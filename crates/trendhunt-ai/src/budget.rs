//! Process-wide AI rate limiting and cost accounting.
//!
//! One [`AiBudget`] is created per run and shared by `Arc` across every
//! worker. It is the only mutable state the workers share: counters are
//! atomics and the token bucket sits behind an async mutex, so concurrent
//! products never over- or under-count.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::AiError;
use crate::provider::TokenUsage;

/// Upper bound on how many requests may be sent back to back.
const MAX_BURST: f64 = 10.0;

/// Request-rate settings for the shared token bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub requests_per_minute: u32,
    /// Longest a caller will wait for a token before failing with
    /// [`AiError::RateLimitExceeded`].
    pub max_wait: Duration,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            requests_per_minute: 30,
            max_wait: Duration::from_secs(60),
        }
    }
}

/// Point-in-time copy of the usage counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UsageSnapshot {
    pub requests: u64,
    pub failures: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl Bucket {
    fn refill(&mut self, per_sec: f64, burst: f64) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * per_sec).min(burst);
        self.last_refill = now;
    }
}

pub struct AiBudget {
    bucket: Mutex<Bucket>,
    refill_per_sec: f64,
    burst: f64,
    max_wait: Duration,
    request_ceiling: Option<u64>,
    requests: AtomicU64,
    failures: AtomicU64,
    input_tokens: AtomicU64,
    output_tokens: AtomicU64,
}

impl AiBudget {
    /// Creates a budget with a full bucket and no request ceiling.
    ///
    /// A `requests_per_minute` of zero is treated as one.
    #[must_use]
    pub fn new(limit: RateLimit) -> Self {
        let rpm = f64::from(limit.requests_per_minute.max(1));
        let burst = rpm.min(MAX_BURST);
        Self {
            bucket: Mutex::new(Bucket {
                tokens: burst,
                last_refill: Instant::now(),
            }),
            refill_per_sec: rpm / 60.0,
            burst,
            max_wait: limit.max_wait,
            request_ceiling: None,
            requests: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            input_tokens: AtomicU64::new(0),
            output_tokens: AtomicU64::new(0),
        }
    }

    /// Caps the total number of requests this budget will grant.
    #[must_use]
    pub fn with_request_ceiling(mut self, ceiling: u64) -> Self {
        self.request_ceiling = Some(ceiling);
        self
    }

    /// Waits for permission to send one request and counts it.
    ///
    /// The request ceiling is checked before the bucket, so a refused call
    /// spends no token. Yields cooperatively while the bucket refills. If the
    /// wait needed would push the total past the configured max wait, fails
    /// right away instead of sleeping first.
    ///
    /// # Errors
    ///
    /// - [`AiError::BudgetExhausted`] once the request ceiling is reached.
    /// - [`AiError::RateLimitExceeded`] when no token frees up in time.
    pub async fn acquire(&self) -> Result<(), AiError> {
        self.reserve_request()?;
        let started = Instant::now();
        loop {
            let wait = {
                let mut bucket = self.bucket.lock().await;
                bucket.refill(self.refill_per_sec, self.burst);
                if bucket.tokens >= 1.0 {
                    bucket.tokens -= 1.0;
                    None
                } else {
                    Some(Duration::from_secs_f64(
                        (1.0 - bucket.tokens) / self.refill_per_sec,
                    ))
                }
            };

            let Some(wait) = wait else {
                return Ok(());
            };

            let waited = started.elapsed();
            if waited + wait > self.max_wait {
                // The request was never sent; give the slot back.
                self.requests.fetch_sub(1, Ordering::SeqCst);
                return Err(AiError::RateLimitExceeded {
                    waited_ms: u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
                });
            }
            tracing::debug!(
                wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                "AI rate limit reached, waiting"
            );
            tokio::time::sleep(wait).await;
        }
    }

    fn reserve_request(&self) -> Result<(), AiError> {
        match self.request_ceiling {
            None => {
                self.requests.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            Some(limit) => self
                .requests
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                    (used < limit).then_some(used + 1)
                })
                .map(|_| ())
                .map_err(|used| AiError::BudgetExhausted { used, limit }),
        }
    }

    /// Adds the token counts reported by a successful provider call.
    pub fn record_usage(&self, usage: TokenUsage) {
        self.input_tokens
            .fetch_add(usage.input_tokens, Ordering::SeqCst);
        self.output_tokens
            .fetch_add(usage.output_tokens, Ordering::SeqCst);
    }

    /// Counts a request that reached the provider but failed.
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::SeqCst);
    }

    #[must_use]
    pub fn snapshot(&self) -> UsageSnapshot {
        UsageSnapshot {
            requests: self.requests.load(Ordering::SeqCst),
            failures: self.failures.load(Ordering::SeqCst),
            input_tokens: self.input_tokens.load(Ordering::SeqCst),
            output_tokens: self.output_tokens.load(Ordering::SeqCst),
        }
    }

    #[must_use]
    pub fn request_ceiling(&self) -> Option<u64> {
        self.request_ceiling
    }
}

impl std::fmt::Debug for AiBudget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiBudget")
            .field("refill_per_sec", &self.refill_per_sec)
            .field("burst", &self.burst)
            .field("max_wait", &self.max_wait)
            .field("request_ceiling", &self.request_ceiling)
            .field("usage", &self.snapshot())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn budget(rpm: u32, max_wait_ms: u64) -> AiBudget {
        AiBudget::new(RateLimit {
            requests_per_minute: rpm,
            max_wait: Duration::from_millis(max_wait_ms),
        })
    }

    #[tokio::test]
    async fn grants_burst_without_waiting() {
        let budget = budget(600, 0);
        for _ in 0..10 {
            budget.acquire().await.unwrap();
        }
        assert_eq!(budget.snapshot().requests, 10);
    }

    #[tokio::test]
    async fn fails_fast_when_wait_exceeds_max() {
        // 1 request per minute: second call would need ~60 s.
        let budget = budget(1, 50);
        budget.acquire().await.unwrap();
        let err = budget.acquire().await.unwrap_err();
        assert!(matches!(err, AiError::RateLimitExceeded { .. }));
        assert_eq!(budget.snapshot().requests, 1);
    }

    #[tokio::test]
    async fn waits_for_refill_within_max_wait() {
        // 600 rpm = one token every 100 ms, burst 10.
        let budget = budget(600, 2_000);
        for _ in 0..10 {
            budget.acquire().await.unwrap();
        }
        let started = std::time::Instant::now();
        budget.acquire().await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(50));
        assert_eq!(budget.snapshot().requests, 11);
    }

    #[tokio::test]
    async fn ceiling_is_never_exceeded_under_concurrency() {
        let budget = Arc::new(budget(6_000, 5_000).with_request_ceiling(5));
        let mut handles = Vec::new();
        for _ in 0..20 {
            let b = Arc::clone(&budget);
            handles.push(tokio::spawn(async move { b.acquire().await.is_ok() }));
        }
        let mut granted = 0;
        for h in handles {
            if h.await.unwrap() {
                granted += 1;
            }
        }
        assert_eq!(granted, 5);
        assert_eq!(budget.snapshot().requests, 5);
    }

    #[tokio::test]
    async fn ceiling_error_reports_usage() {
        let budget = budget(600, 0).with_request_ceiling(1);
        budget.acquire().await.unwrap();
        let err = budget.acquire().await.unwrap_err();
        assert!(matches!(err, AiError::BudgetExhausted { used: 1, limit: 1 }));
    }

    #[tokio::test]
    async fn refused_call_spends_no_token() {
        let budget = budget(60, 0).with_request_ceiling(1);
        budget.acquire().await.unwrap();
        let before = budget.bucket.lock().await.tokens;
        let err = budget.acquire().await.unwrap_err();
        assert!(matches!(err, AiError::BudgetExhausted { .. }));
        let after = budget.bucket.lock().await.tokens;
        assert!((after - before).abs() < 0.5, "token spent: {before} -> {after}");
    }

    #[test]
    fn usage_and_failures_accumulate() {
        let budget = budget(60, 0);
        budget.record_usage(TokenUsage {
            input_tokens: 120,
            output_tokens: 40,
        });
        budget.record_usage(TokenUsage {
            input_tokens: 30,
            output_tokens: 10,
        });
        budget.record_failure();
        let snap = budget.snapshot();
        assert_eq!(snap.input_tokens, 150);
        assert_eq!(snap.output_tokens, 50);
        assert_eq!(snap.failures, 1);
        assert_eq!(snap.requests, 0);
    }
}
