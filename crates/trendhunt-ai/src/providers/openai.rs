use std::time::Duration;

use async_trait::async_trait;

use super::chat::{ChatCompletionsClient, ResponseFormat};
use crate::error::AiError;
use crate::provider::{CompletionProvider, CompletionRequest, ProviderReply};

const OPENAI_API_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o";

/// OpenAI chat completions with native JSON-schema output.
pub struct OpenAiProvider {
    inner: ChatCompletionsClient,
}

impl OpenAiProvider {
    /// # Errors
    ///
    /// Returns [`AiError::Http`] if the HTTP client cannot be constructed.
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self, AiError> {
        Ok(Self {
            inner: ChatCompletionsClient::new(
                "openai",
                api_key,
                OPENAI_API_URL,
                DEFAULT_MODEL,
                ResponseFormat::JsonSchema,
                timeout,
            )?,
        })
    }

    /// Points the client at a different API root (used with mock servers).
    #[must_use]
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.inner.set_base_url(url);
        self
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.inner.model
    }

    async fn send(&self, request: &CompletionRequest<'_>) -> Result<ProviderReply, AiError> {
        self.inner.send(request).await
    }
}
