//! The provider seam: one implementation per AI backend, chosen once from
//! configuration.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use trendhunt_core::AiProviderKind;

use crate::error::AiError;
use crate::providers::{AnthropicProvider, OpenAiProvider, OpenRouterProvider};
use crate::schema::SchemaHint;

/// Token counts reported by a provider for one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Everything a provider needs to issue one completion.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub system: &'a str,
    pub prompt: &'a str,
    pub schema: &'a SchemaHint,
    pub max_tokens: u32,
}

/// Raw text answer plus accounting data.
#[derive(Debug, Clone)]
pub struct ProviderReply {
    pub text: String,
    pub usage: TokenUsage,
}

/// Request/response contract every AI backend implements.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider name used in logs and errors.
    fn name(&self) -> &'static str;

    fn model(&self) -> &str;

    /// Sends one request. No retries happen at this level.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] for transport failures, non-2xx statuses, or an
    /// envelope without text content.
    async fn send(&self, request: &CompletionRequest<'_>) -> Result<ProviderReply, AiError>;
}

/// Connection settings shared by every provider.
#[derive(Debug, Clone, Copy)]
pub struct ProviderOptions<'a> {
    /// Only honoured by OpenRouter.
    pub model_override: Option<&'a str>,
    /// Sent as OpenRouter's `HTTP-Referer`.
    pub site_url: &'a str,
    /// Replaces the provider's API root (mock servers).
    pub base_url: Option<&'a str>,
    pub timeout: Duration,
}

/// Builds the provider selected for a run.
///
/// # Errors
///
/// Returns [`AiError::Http`] if the HTTP client cannot be constructed.
pub fn build_provider(
    kind: AiProviderKind,
    api_key: &str,
    options: &ProviderOptions<'_>,
) -> Result<Arc<dyn CompletionProvider>, AiError> {
    let provider: Arc<dyn CompletionProvider> = match kind {
        AiProviderKind::OpenRouter => {
            let mut provider =
                OpenRouterProvider::new(api_key, options.timeout)?.with_site_url(options.site_url);
            if let Some(model) = options.model_override {
                provider = provider.with_model(model);
            }
            if let Some(url) = options.base_url {
                provider = provider.with_base_url(url);
            }
            Arc::new(provider)
        }
        AiProviderKind::Anthropic => {
            let mut provider = AnthropicProvider::new(api_key, options.timeout)?;
            if let Some(url) = options.base_url {
                provider = provider.with_base_url(url);
            }
            Arc::new(provider)
        }
        AiProviderKind::OpenAi => {
            let mut provider = OpenAiProvider::new(api_key, options.timeout)?;
            if let Some(url) = options.base_url {
                provider = provider.with_base_url(url);
            }
            Arc::new(provider)
        }
    };
    tracing::info!(
        provider = provider.name(),
        model = provider.model(),
        "AI provider configured"
    );
    Ok(provider)
}
