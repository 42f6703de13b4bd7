use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn build_app_config_succeeds_with_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.ai_timeout_secs, 60);
    assert_eq!(cfg.ai_max_retries, 3);
    assert_eq!(cfg.ai_retry_backoff_base_ms, 1000);
    assert_eq!(cfg.ai_requests_per_minute, 30);
    assert_eq!(cfg.ai_rate_limit_max_wait_secs, 60);
    assert_eq!(cfg.ai_max_tokens, 1024);
    assert_eq!(cfg.site_url, DEFAULT_SITE_URL);
    assert_eq!(cfg.concurrency, 4);
    assert_eq!(cfg.max_review_sample, 20);
    assert_eq!(cfg.review_char_limit, 280);
    assert!(cfg.run_timeout_secs.is_none());
    assert!(cfg.apify_token.is_none());
    assert_eq!(cfg.apify_actor_id, "clockworks~tiktok-scraper");
    assert_eq!(cfg.scraper_timeout_secs, 300);
    assert!(cfg.openrouter_api_key.is_none());
}

#[test]
fn build_app_config_reads_api_keys() {
    let mut map = HashMap::new();
    map.insert("OPENROUTER_API_KEY", "or-key");
    map.insert("ANTHROPIC_API_KEY", "sk-ant");
    map.insert("OPENROUTER_MODEL", "meta-llama/llama-3.3-8b-instruct:free");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.openrouter_api_key.as_deref(), Some("or-key"));
    assert_eq!(cfg.anthropic_api_key.as_deref(), Some("sk-ant"));
    assert!(cfg.openai_api_key.is_none());
    assert_eq!(
        cfg.openrouter_model.as_deref(),
        Some("meta-llama/llama-3.3-8b-instruct:free")
    );
}

#[test]
fn blank_api_key_is_treated_as_unset() {
    let mut map = HashMap::new();
    map.insert("OPENAI_API_KEY", "   ");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.openai_api_key.is_none());
}

#[test]
fn invalid_max_retries_is_rejected() {
    let mut map = HashMap::new();
    map.insert("TRENDHUNT_AI_MAX_RETRIES", "not-a-number");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "TRENDHUNT_AI_MAX_RETRIES"),
        "expected InvalidEnvVar(TRENDHUNT_AI_MAX_RETRIES), got: {result:?}"
    );
}

#[test]
fn zero_concurrency_is_rejected() {
    let mut map = HashMap::new();
    map.insert("TRENDHUNT_CONCURRENCY", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "TRENDHUNT_CONCURRENCY"),
        "expected InvalidEnvVar(TRENDHUNT_CONCURRENCY), got: {result:?}"
    );
}

#[test]
fn zero_requests_per_minute_is_rejected() {
    let mut map = HashMap::new();
    map.insert("TRENDHUNT_AI_REQUESTS_PER_MINUTE", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(
        result,
        Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "TRENDHUNT_AI_REQUESTS_PER_MINUTE"
    ));
}

#[test]
fn run_timeout_override() {
    let mut map = HashMap::new();
    map.insert("TRENDHUNT_RUN_TIMEOUT_SECS", "900");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.run_timeout_secs, Some(900));
}

#[test]
fn run_timeout_invalid() {
    let mut map = HashMap::new();
    map.insert("TRENDHUNT_RUN_TIMEOUT_SECS", "soon");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(
        result,
        Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "TRENDHUNT_RUN_TIMEOUT_SECS"
    ));
}

#[test]
fn debug_output_redacts_secrets() {
    let mut map = HashMap::new();
    map.insert("APIFY_TOKEN", "apify_api_secret");
    map.insert("OPENAI_API_KEY", "sk-secret");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("apify_api_secret"));
    assert!(!rendered.contains("sk-secret"));
    assert!(rendered.contains("[redacted]"));
}

#[test]
fn concurrency_above_input_cap_is_rejected() {
    let mut map = HashMap::new();
    map.insert("TRENDHUNT_CONCURRENCY", "17");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, ref reason }) if var == "TRENDHUNT_CONCURRENCY" && reason.contains("between 1 and 16")),
        "expected InvalidEnvVar(TRENDHUNT_CONCURRENCY), got: {result:?}"
    );

    map.insert("TRENDHUNT_CONCURRENCY", "16");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.concurrency, 16);
}

#[test]
fn site_url_and_max_tokens_are_overridable() {
    let mut map = HashMap::new();
    map.insert("TRENDHUNT_SITE_URL", "https://shop.example");
    map.insert("TRENDHUNT_AI_MAX_TOKENS", "2048");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.site_url, "https://shop.example");
    assert_eq!(cfg.ai_max_tokens, 2048);

    map.insert("TRENDHUNT_AI_MAX_TOKENS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "TRENDHUNT_AI_MAX_TOKENS"),
        "expected InvalidEnvVar(TRENDHUNT_AI_MAX_TOKENS), got: {result:?}"
    );
}
