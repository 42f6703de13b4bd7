//! The adapter callers use: one `complete` call per analysis step.
//!
//! Every attempt (including retries) first takes a token from the shared
//! [`AiBudget`]. Usage is recorded on success, failures are counted, and the
//! reply text is parsed into a JSON object before it is returned.

use std::sync::Arc;

use crate::budget::{AiBudget, UsageSnapshot};
use crate::error::AiError;
use crate::parse::{parse_object, Completion};
use crate::provider::{CompletionProvider, CompletionRequest};
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::schema::SchemaHint;

/// Default completion length, in tokens.
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Shared, cheaply clonable AI client.
#[derive(Clone)]
pub struct AiClient {
    provider: Arc<dyn CompletionProvider>,
    budget: Arc<AiBudget>,
    retry: RetryPolicy,
    max_tokens: u32,
}

impl std::fmt::Debug for AiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiClient")
            .field("provider", &self.provider.name())
            .field("model", &self.provider.model())
            .field("budget", &self.budget)
            .field("retry", &self.retry)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl AiClient {
    #[must_use]
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        budget: Arc<AiBudget>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            provider,
            budget,
            retry,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub fn budget(&self) -> &Arc<AiBudget> {
        &self.budget
    }

    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    #[must_use]
    pub fn usage(&self) -> UsageSnapshot {
        self.budget.snapshot()
    }

    /// Sends a prompt and returns the parsed JSON object.
    ///
    /// # Errors
    ///
    /// - [`AiError::RateLimitExceeded`] / [`AiError::BudgetExhausted`] when
    ///   the run's budget refuses the call.
    /// - Transport and status errors once retries are exhausted.
    /// - [`AiError::Parse`] when the reply holds no JSON object.
    pub async fn complete(
        &self,
        system: &str,
        prompt: &str,
        schema: &SchemaHint,
    ) -> Result<Completion, AiError> {
        let request = CompletionRequest {
            system,
            prompt,
            schema,
            max_tokens: self.max_tokens,
        };

        let reply = retry_with_backoff(self.retry.max_retries, self.retry.backoff_base_ms, || {
            let request = request;
            async move {
                self.budget.acquire().await?;
                match self.provider.send(&request).await {
                    Ok(reply) => {
                        self.budget.record_usage(reply.usage);
                        Ok(reply)
                    }
                    Err(err) => {
                        self.budget.record_failure();
                        Err(err)
                    }
                }
            }
        })
        .await?;

        let (fields, mode) = parse_object(&reply.text).inspect_err(|err| {
            tracing::warn!(
                provider = self.provider.name(),
                schema = %schema.name,
                error = %err,
                "model reply was not parseable"
            );
        })?;
        tracing::debug!(
            provider = self.provider.name(),
            schema = %schema.name,
            ?mode,
            input_tokens = reply.usage.input_tokens,
            output_tokens = reply.usage.output_tokens,
            "AI completion parsed"
        );

        Ok(Completion {
            fields,
            mode,
            usage: reply.usage,
        })
    }
}
