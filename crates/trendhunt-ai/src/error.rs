use thiserror::Error;

/// Errors returned by the AI client adapter.
///
/// Transient variants are retried inside the adapter (see
/// [`crate::retry::is_retriable`]); everything that reaches a caller is a
/// typed failure the caller is expected to degrade around.
#[derive(Debug, Error)]
pub enum AiError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP 429 from the provider.
    #[error("{provider} rate limited the request")]
    RateLimited {
        provider: &'static str,
        retry_after_secs: Option<u64>,
    },

    /// HTTP 401/403: bad or revoked credentials.
    #[error("{provider} rejected the credentials (HTTP {status})")]
    Auth { provider: &'static str, status: u16 },

    /// Any other non-2xx status. 5xx is retried, 4xx is not.
    #[error("unexpected HTTP status {status} from {provider}: {body}")]
    UnexpectedStatus {
        provider: &'static str,
        status: u16,
        body: String,
    },

    /// The provider envelope did not match the expected wire shape.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The provider answered without any text content.
    #[error("{provider} returned no content")]
    EmptyResponse { provider: &'static str },

    /// Neither structured nor best-effort extraction produced a JSON object.
    #[error("could not parse model output: {0}")]
    Parse(String),

    /// The local rate limiter could not grant a request within the max wait.
    #[error("AI rate limit exceeded after waiting {waited_ms} ms")]
    RateLimitExceeded { waited_ms: u64 },

    /// The per-run request ceiling has been reached.
    #[error("AI request budget exhausted ({used}/{limit} requests)")]
    BudgetExhausted { used: u64, limit: u64 },

    /// Client construction failed (bad header value, TLS setup, ...).
    #[error("invalid AI client configuration: {0}")]
    InvalidConfig(String),
}

impl AiError {
    /// `true` for failures caused by the run's own AI budget rather than by
    /// the provider. Callers treat these as item failures instead of
    /// degrading.
    #[must_use]
    pub fn is_budget_failure(&self) -> bool {
        matches!(
            self,
            AiError::RateLimitExceeded { .. } | AiError::BudgetExhausted { .. }
        )
    }
}
