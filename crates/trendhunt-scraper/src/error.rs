use thiserror::Error;
use trendhunt_core::FetchError;

#[derive(Debug, Error)]
pub enum ApifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by Apify (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("Apify rejected the token (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("unexpected HTTP status {status} from {url}: {body}")]
    UnexpectedStatus {
        status: u16,
        url: String,
        body: String,
    },

    #[error("actor run {run_id} finished with status {status}")]
    RunFailed { run_id: String, status: String },

    #[error("dataset item {item_id:?} could not be normalized: {reason}")]
    Normalization { item_id: String, reason: String },

    #[error("actor run {run_id} did not finish within {waited_secs}s")]
    RunTimeout { run_id: String, waited_secs: u64 },
}

impl From<ApifyError> for FetchError {
    fn from(err: ApifyError) -> Self {
        FetchError::Unavailable(err.to_string())
    }
}
