//! OpenAI-compatible `chat/completions` client shared by the OpenAI and
//! OpenRouter providers.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{check_status, decode, http_client};
use crate::error::AiError;
use crate::provider::{CompletionRequest, ProviderReply, TokenUsage};

/// How the schema hint is passed as `response_format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResponseFormat {
    /// `{"type": "json_schema", ...}` carrying the schema itself.
    JsonSchema,
    /// `{"type": "json_object"}`; the schema goes into the system prompt.
    JsonObject,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
    response_format: Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

pub(crate) struct ChatCompletionsClient {
    provider: &'static str,
    http: Client,
    api_key: String,
    base_url: String,
    pub(crate) model: String,
    format: ResponseFormat,
    extra_headers: HeaderMap,
}

impl ChatCompletionsClient {
    pub(crate) fn new(
        provider: &'static str,
        api_key: &str,
        base_url: &str,
        model: &str,
        format: ResponseFormat,
        timeout: Duration,
    ) -> Result<Self, AiError> {
        Ok(Self {
            provider,
            http: http_client(timeout)?,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            format,
            extra_headers: HeaderMap::new(),
        })
    }

    pub(crate) fn set_base_url(&mut self, url: &str) {
        self.base_url = url.trim_end_matches('/').to_string();
    }

    /// Adds a header sent with every request. Invalid values are ignored.
    pub(crate) fn insert_header(&mut self, name: &'static str, value: &str) {
        if let Ok(val) = HeaderValue::from_str(value) {
            self.extra_headers.insert(name, val);
        }
    }

    fn headers(&self) -> Result<HeaderMap, AiError> {
        let mut headers = self.extra_headers.clone();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|e| AiError::InvalidConfig(format!("API key is not a valid header: {e}")))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    pub(crate) async fn send(
        &self,
        request: &CompletionRequest<'_>,
    ) -> Result<ProviderReply, AiError> {
        let url = format!("{}/chat/completions", self.base_url);

        let (system, response_format) = match self.format {
            ResponseFormat::JsonSchema => (
                request.system.to_string(),
                json!({
                    "type": "json_schema",
                    "json_schema": {
                        "name": request.schema.name,
                        "schema": request.schema.schema,
                        "strict": false,
                    }
                }),
            ),
            ResponseFormat::JsonObject => (
                format!(
                    "{}\n\nRespond ONLY with a JSON object matching this JSON schema:\n{}",
                    request.system,
                    request.schema.render()
                ),
                json!({ "type": "json_object" }),
            ),
        };

        let body = ChatRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &system,
                },
                ChatMessage {
                    role: "user",
                    content: request.prompt,
                },
            ],
            response_format,
        };

        tracing::debug!(provider = self.provider, model = %self.model, "chat completion request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await?;
        let response = check_status(self.provider, response).await?;
        let parsed: ChatResponse = decode(self.provider, response).await?;

        let usage = parsed.usage.unwrap_or_default();
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or(AiError::EmptyResponse {
                provider: self.provider,
            })?;

        Ok(ProviderReply {
            text,
            usage: TokenUsage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
            },
        })
    }
}
