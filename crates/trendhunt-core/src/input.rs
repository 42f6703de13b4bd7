//! Per-run input, as submitted by the hosting platform or the CLI, and its
//! validation into [`RunSettings`].

use serde::Deserialize;

use crate::app_config::AppConfig;
use crate::ConfigError;

pub const DEFAULT_CATEGORY: &str = "Kitchen Gadgets";
pub const MAX_PRODUCTS_LIMIT: usize = 50;
pub const MAX_CONCURRENCY: usize = 16;

/// AI backend selected for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiProviderKind {
    OpenRouter,
    Anthropic,
    OpenAi,
}

impl AiProviderKind {
    /// Parses the provider names accepted in run input.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidInput`] for unknown providers.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "openrouter" => Ok(Self::OpenRouter),
            "anthropic" => Ok(Self::Anthropic),
            "openai" => Ok(Self::OpenAi),
            other => Err(ConfigError::InvalidInput {
                field: "aiProvider".to_string(),
                reason: format!("unknown AI provider \"{other}\""),
            }),
        }
    }
}

impl std::fmt::Display for AiProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AiProviderKind::OpenRouter => write!(f, "openrouter"),
            AiProviderKind::Anthropic => write!(f, "anthropic"),
            AiProviderKind::OpenAi => write!(f, "openai"),
        }
    }
}

/// Raw run input with camelCase keys and platform defaults.
///
/// Numeric fields are signed so that out-of-range values surface as
/// [`ConfigError::InvalidInput`] instead of an opaque deserialization error.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunInput {
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_max_products")]
    pub max_products: i64,
    #[serde(default = "default_provider")]
    pub ai_provider: String,
    #[serde(default)]
    pub openrouter_api_key: Option<String>,
    #[serde(default)]
    pub anthropic_api_key: Option<String>,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub openrouter_model: Option<String>,
    #[serde(default = "default_true")]
    pub include_review_analysis: bool,
    #[serde(default = "default_min_sales_count")]
    pub min_sales_count: i64,
    #[serde(default)]
    pub concurrency: Option<i64>,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

fn default_max_products() -> i64 {
    10
}

fn default_provider() -> String {
    "openrouter".to_string()
}

fn default_true() -> bool {
    true
}

fn default_min_sales_count() -> i64 {
    100
}

impl Default for RunInput {
    fn default() -> Self {
        Self {
            category: default_category(),
            max_products: default_max_products(),
            ai_provider: default_provider(),
            openrouter_api_key: None,
            anthropic_api_key: None,
            openai_api_key: None,
            openrouter_model: None,
            include_review_analysis: true,
            min_sales_count: default_min_sales_count(),
            concurrency: None,
        }
    }
}

impl RunInput {
    /// Parses run input from a JSON document. An empty document yields defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MalformedInput`] if `raw` is not a JSON object
    /// matching the input shape.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(raw)?)
    }
}

/// Validated, fully-resolved settings for one pipeline run.
#[derive(Clone)]
pub struct RunSettings {
    pub category: String,
    pub max_products: usize,
    pub provider: AiProviderKind,
    pub api_key: String,
    pub model_override: Option<String>,
    pub include_review_analysis: bool,
    pub min_sales_count: u64,
    pub concurrency: usize,
}

impl std::fmt::Debug for RunSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunSettings")
            .field("category", &self.category)
            .field("max_products", &self.max_products)
            .field("provider", &self.provider)
            .field("api_key", &"[redacted]")
            .field("model_override", &self.model_override)
            .field("include_review_analysis", &self.include_review_analysis)
            .field("min_sales_count", &self.min_sales_count)
            .field("concurrency", &self.concurrency)
            .finish()
    }
}

/// Validates `input` and fills gaps from the process configuration.
///
/// API keys missing from the input fall back to the matching environment
/// key; the OpenRouter model falls back to `OPENROUTER_MODEL`.
///
/// # Errors
///
/// Returns [`ConfigError`] for out-of-range values, unknown providers, or a
/// missing key for the selected provider.
pub fn resolve_run_settings(
    input: &RunInput,
    app: &AppConfig,
) -> Result<RunSettings, ConfigError> {
    let category = input.category.trim();
    if category.is_empty() {
        return Err(ConfigError::InvalidInput {
            field: "category".to_string(),
            reason: "must not be empty".to_string(),
        });
    }

    let max_products = usize::try_from(input.max_products)
        .ok()
        .filter(|n| (1..=MAX_PRODUCTS_LIMIT).contains(n))
        .ok_or_else(|| ConfigError::InvalidInput {
            field: "maxProducts".to_string(),
            reason: format!(
                "must be between 1 and {MAX_PRODUCTS_LIMIT}, got {}",
                input.max_products
            ),
        })?;

    let min_sales_count =
        u64::try_from(input.min_sales_count).map_err(|_| ConfigError::InvalidInput {
            field: "minSalesCount".to_string(),
            reason: format!("must be >= 0, got {}", input.min_sales_count),
        })?;

    let concurrency = match input.concurrency {
        None => app.concurrency,
        Some(raw) => usize::try_from(raw)
            .ok()
            .filter(|n| (1..=MAX_CONCURRENCY).contains(n))
            .ok_or_else(|| ConfigError::InvalidInput {
                field: "concurrency".to_string(),
                reason: format!("must be between 1 and {MAX_CONCURRENCY}, got {raw}"),
            })?,
    };

    let provider = AiProviderKind::parse(&input.ai_provider)?;

    let non_blank = |key: &Option<String>| -> Option<String> {
        key.as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
    };

    let api_key = match provider {
        AiProviderKind::OpenRouter => {
            non_blank(&input.openrouter_api_key).or_else(|| app.openrouter_api_key.clone())
        }
        AiProviderKind::Anthropic => {
            non_blank(&input.anthropic_api_key).or_else(|| app.anthropic_api_key.clone())
        }
        AiProviderKind::OpenAi => {
            non_blank(&input.openai_api_key).or_else(|| app.openai_api_key.clone())
        }
    }
    .ok_or_else(|| ConfigError::MissingApiKey {
        provider: provider.to_string(),
    })?;

    let model_override = match provider {
        AiProviderKind::OpenRouter => {
            non_blank(&input.openrouter_model).or_else(|| app.openrouter_model.clone())
        }
        AiProviderKind::Anthropic | AiProviderKind::OpenAi => None,
    };

    Ok(RunSettings {
        category: category.to_string(),
        max_products,
        provider,
        api_key,
        model_override,
        include_review_analysis: input.include_review_analysis,
        min_sales_count,
        concurrency,
    })
}

#[cfg(test)]
#[path = "input_test.rs"]
mod tests;
