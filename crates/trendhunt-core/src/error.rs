use thiserror::Error;

/// Invalid or missing run configuration. Always fatal, raised before any
/// network call is made.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("invalid run input field {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("run input is not valid JSON: {0}")]
    MalformedInput(#[from] serde_json::Error),

    #[error("{provider} API key is required when using the {provider} provider")]
    MissingApiKey { provider: String },
}

/// The scraping collaborator could not produce any usable products.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("product source unavailable: {0}")]
    Unavailable(String),

    #[error("no products found for category \"{category}\"")]
    NoProducts { category: String },
}

/// The persistence collaborator rejected a finished record.
#[derive(Debug, Error)]
#[error("failed to emit product \"{title}\": {reason}")]
pub struct SinkError {
    pub title: String,
    pub reason: String,
}
