//! Concrete AI backends.

mod anthropic;
mod chat;
mod openai;
mod openrouter;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;
pub use openrouter::OpenRouterProvider;

use std::time::Duration;

use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::error::AiError;

const USER_AGENT: &str = "trendhunt/0.1 (product-analysis)";

/// Longest error body kept in [`AiError::UnexpectedStatus`].
const MAX_ERROR_BODY_CHARS: usize = 500;

pub(crate) fn http_client(timeout: Duration) -> Result<Client, AiError> {
    Ok(Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .user_agent(USER_AGENT)
        .build()?)
}

/// Maps a non-2xx response onto the matching [`AiError`] variant.
pub(crate) async fn check_status(
    provider: &'static str,
    response: Response,
) -> Result<Response, AiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after_secs = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    let body: String = response
        .text()
        .await
        .unwrap_or_default()
        .chars()
        .take(MAX_ERROR_BODY_CHARS)
        .collect();

    Err(match status.as_u16() {
        401 | 403 => AiError::Auth {
            provider,
            status: status.as_u16(),
        },
        429 => AiError::RateLimited {
            provider,
            retry_after_secs,
        },
        code => AiError::UnexpectedStatus {
            provider,
            status: code,
            body,
        },
    })
}

/// Reads the body and deserializes the provider envelope.
pub(crate) async fn decode<T: DeserializeOwned>(
    provider: &'static str,
    response: Response,
) -> Result<T, AiError> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|source| AiError::Deserialize {
        context: format!("{provider} response envelope"),
        source,
    })
}
