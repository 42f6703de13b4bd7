use std::time::Duration;

use async_trait::async_trait;
use trendhunt_core::config::DEFAULT_SITE_URL;

use super::chat::{ChatCompletionsClient, ResponseFormat};
use crate::error::AiError;
use crate::provider::{CompletionProvider, CompletionRequest, ProviderReply};

const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1";
const DEFAULT_MODEL: &str = "nvidia/nemotron-nano-9b-v2:free";
const APP_NAME: &str = "trendhunt";

/// OpenRouter's OpenAI-compatible endpoint.
///
/// Many routed models ignore `json_schema`, so the schema is sent in the
/// system prompt and only `json_object` mode is requested.
pub struct OpenRouterProvider {
    inner: ChatCompletionsClient,
}

impl OpenRouterProvider {
    /// Both attribution headers are set; `HTTP-Referer` starts out as
    /// [`DEFAULT_SITE_URL`].
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Http`] if the HTTP client cannot be constructed.
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self, AiError> {
        let mut inner = ChatCompletionsClient::new(
            "openrouter",
            api_key,
            OPENROUTER_API_URL,
            DEFAULT_MODEL,
            ResponseFormat::JsonObject,
            timeout,
        )?;
        inner.insert_header("X-Title", APP_NAME);
        inner.insert_header("HTTP-Referer", DEFAULT_SITE_URL);
        Ok(Self { inner })
    }

    #[must_use]
    pub fn with_model(mut self, model: &str) -> Self {
        self.inner.model = model.to_string();
        self
    }

    /// Replaces the `HTTP-Referer` attribution header.
    #[must_use]
    pub fn with_site_url(mut self, url: &str) -> Self {
        self.inner.insert_header("HTTP-Referer", url);
        self
    }

    /// Points the client at a different API root (used with mock servers).
    #[must_use]
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.inner.set_base_url(url);
        self
    }
}

#[async_trait]
impl CompletionProvider for OpenRouterProvider {
    fn name(&self) -> &'static str {
        "openrouter"
    }

    fn model(&self) -> &str {
        &self.inner.model
    }

    async fn send(&self, request: &CompletionRequest<'_>) -> Result<ProviderReply, AiError> {
        self.inner.send(request).await
    }
}
