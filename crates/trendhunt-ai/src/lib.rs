//! AI client adapter: provider selection, rate limiting, retries and
//! tolerant JSON parsing behind a single [`AiClient::complete`] call.

pub mod budget;
pub mod client;
pub mod error;
pub mod parse;
pub mod provider;
pub mod providers;
pub mod retry;
pub mod schema;

pub use budget::{AiBudget, RateLimit, UsageSnapshot};
pub use client::{AiClient, DEFAULT_MAX_TOKENS};
pub use error::AiError;
pub use parse::{parse_object, strip_code_blocks, Completion, ParseMode};
pub use provider::{
    build_provider, CompletionProvider, CompletionRequest, ProviderOptions, ProviderReply,
    TokenUsage,
};
pub use providers::{AnthropicProvider, OpenAiProvider, OpenRouterProvider};
pub use retry::RetryPolicy;
pub use schema::SchemaHint;
