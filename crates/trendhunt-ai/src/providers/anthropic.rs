use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{check_status, decode, http_client};
use crate::error::AiError;
use crate::provider::{CompletionProvider, CompletionRequest, ProviderReply, TokenUsage};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: String,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Default, Deserialize)]
struct WireUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

/// Anthropic Messages API. Has no response-format switch, so the schema is
/// appended to the system prompt.
pub struct AnthropicProvider {
    api_key: String,
    http: Client,
    base_url: String,
    model: String,
}

impl AnthropicProvider {
    /// # Errors
    ///
    /// Returns [`AiError::Http`] if the HTTP client cannot be constructed.
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self, AiError> {
        Ok(Self {
            api_key: api_key.to_string(),
            http: http_client(timeout)?,
            base_url: ANTHROPIC_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        })
    }

    /// Points the client at a different API root (used with mock servers).
    #[must_use]
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    fn headers(&self) -> Result<HeaderMap, AiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key).map_err(|e| {
                AiError::InvalidConfig(format!("API key is not a valid header: {e}"))
            })?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[async_trait]
impl CompletionProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn send(&self, request: &CompletionRequest<'_>) -> Result<ProviderReply, AiError> {
        let url = format!("{}/messages", self.base_url);
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            system: format!(
                "{}\n\nRespond ONLY with a JSON object matching this JSON schema:\n{}",
                request.system,
                request.schema.render()
            ),
            messages: vec![WireMessage {
                role: "user",
                content: request.prompt,
            }],
        };

        tracing::debug!(model = %self.model, "Claude messages request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await?;
        let response = check_status("anthropic", response).await?;
        let parsed: MessagesResponse = decode("anthropic", response).await?;

        let text: String = parsed
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");
        if text.trim().is_empty() {
            return Err(AiError::EmptyResponse {
                provider: "anthropic",
            });
        }

        let usage = parsed.usage.unwrap_or_default();
        Ok(ProviderReply {
            text,
            usage: TokenUsage {
                input_tokens: usage.input_tokens,
                output_tokens: usage.output_tokens,
            },
        })
    }
}
