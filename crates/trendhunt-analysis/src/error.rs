use thiserror::Error;
use trendhunt_ai::AiError;
use trendhunt_core::FetchError;

/// Failure while processing one product. The product is dropped and counted;
/// its siblings are unaffected.
#[derive(Debug, Error)]
pub enum ItemProcessingError {
    /// The run's AI budget refused a call (rate limit wait exceeded or
    /// request ceiling reached).
    #[error("AI budget refused the request: {0}")]
    AiBudget(#[source] AiError),

    #[error("product pipeline panicked: {0}")]
    Panicked(String),
}

/// Run-fatal pipeline errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
}
