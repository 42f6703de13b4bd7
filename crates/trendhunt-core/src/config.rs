use crate::app_config::AppConfig;
use crate::input::MAX_CONCURRENCY;
use crate::ConfigError;

/// Sent as OpenRouter's `HTTP-Referer` unless `TRENDHUNT_SITE_URL` is set.
pub const DEFAULT_SITE_URL: &str = "https://github.com/trendhunt/trendhunt";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can use a plain `HashMap`.
pub(crate) fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Empty values are treated as unset so `.env` templates with blank keys work.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let log_level = or_default("TRENDHUNT_LOG_LEVEL", "info");

    let ai_timeout_secs = parse_u64("TRENDHUNT_AI_TIMEOUT_SECS", "60")?;
    let ai_max_retries = parse_u32("TRENDHUNT_AI_MAX_RETRIES", "3")?;
    let ai_retry_backoff_base_ms = parse_u64("TRENDHUNT_AI_RETRY_BACKOFF_BASE_MS", "1000")?;
    let ai_requests_per_minute = parse_u32("TRENDHUNT_AI_REQUESTS_PER_MINUTE", "30")?;
    if ai_requests_per_minute == 0 {
        return Err(invalid(
            "TRENDHUNT_AI_REQUESTS_PER_MINUTE",
            "must be greater than zero".to_string(),
        ));
    }
    let ai_rate_limit_max_wait_secs = parse_u64("TRENDHUNT_AI_RATE_LIMIT_MAX_WAIT_SECS", "60")?;
    let ai_max_tokens = parse_u32("TRENDHUNT_AI_MAX_TOKENS", "1024")?;
    if ai_max_tokens == 0 {
        return Err(invalid(
            "TRENDHUNT_AI_MAX_TOKENS",
            "must be greater than zero".to_string(),
        ));
    }
    let site_url = optional("TRENDHUNT_SITE_URL").unwrap_or_else(|| DEFAULT_SITE_URL.to_string());

    let concurrency = parse_usize("TRENDHUNT_CONCURRENCY", "4")?;
    if !(1..=MAX_CONCURRENCY).contains(&concurrency) {
        return Err(invalid(
            "TRENDHUNT_CONCURRENCY",
            format!("must be between 1 and {MAX_CONCURRENCY}, got {concurrency}"),
        ));
    }
    let max_review_sample = parse_usize("TRENDHUNT_MAX_REVIEW_SAMPLE", "20")?;
    let review_char_limit = parse_usize("TRENDHUNT_REVIEW_CHAR_LIMIT", "280")?;

    let run_timeout_secs = optional("TRENDHUNT_RUN_TIMEOUT_SECS")
        .map(|raw| {
            raw.parse::<u64>()
                .map_err(|e| invalid("TRENDHUNT_RUN_TIMEOUT_SECS", e.to_string()))
        })
        .transpose()?;

    let apify_token = optional("APIFY_TOKEN");
    let apify_actor_id = or_default("TRENDHUNT_APIFY_ACTOR_ID", "clockworks~tiktok-scraper");
    let scraper_timeout_secs = parse_u64("TRENDHUNT_SCRAPER_TIMEOUT_SECS", "300")?;

    Ok(AppConfig {
        log_level,
        ai_timeout_secs,
        ai_max_retries,
        ai_retry_backoff_base_ms,
        ai_requests_per_minute,
        ai_rate_limit_max_wait_secs,
        ai_max_tokens,
        site_url,
        concurrency,
        max_review_sample,
        review_char_limit,
        run_timeout_secs,
        apify_token,
        apify_actor_id,
        scraper_timeout_secs,
        openrouter_api_key: optional("OPENROUTER_API_KEY"),
        anthropic_api_key: optional("ANTHROPIC_API_KEY"),
        openai_api_key: optional("OPENAI_API_KEY"),
        openrouter_model: optional("OPENROUTER_MODEL"),
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
