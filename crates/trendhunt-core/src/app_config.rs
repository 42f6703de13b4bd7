/// Process-level settings read from the environment.
///
/// Per-run choices (category, provider, limits) live in
/// [`crate::RunInput`]; this struct holds tuning knobs and fallback secrets.
#[derive(Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub ai_timeout_secs: u64,
    pub ai_max_retries: u32,
    pub ai_retry_backoff_base_ms: u64,
    pub ai_requests_per_minute: u32,
    pub ai_rate_limit_max_wait_secs: u64,
    pub ai_max_tokens: u32,
    /// OpenRouter attribution (`HTTP-Referer`).
    pub site_url: String,
    pub concurrency: usize,
    pub max_review_sample: usize,
    pub review_char_limit: usize,
    pub run_timeout_secs: Option<u64>,
    pub apify_token: Option<String>,
    pub apify_actor_id: String,
    pub scraper_timeout_secs: u64,
    pub openrouter_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub openrouter_model: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("ai_timeout_secs", &self.ai_timeout_secs)
            .field("ai_max_retries", &self.ai_max_retries)
            .field("ai_retry_backoff_base_ms", &self.ai_retry_backoff_base_ms)
            .field("ai_requests_per_minute", &self.ai_requests_per_minute)
            .field(
                "ai_rate_limit_max_wait_secs",
                &self.ai_rate_limit_max_wait_secs,
            )
            .field("ai_max_tokens", &self.ai_max_tokens)
            .field("site_url", &self.site_url)
            .field("concurrency", &self.concurrency)
            .field("max_review_sample", &self.max_review_sample)
            .field("review_char_limit", &self.review_char_limit)
            .field("run_timeout_secs", &self.run_timeout_secs)
            .field("apify_token", &self.apify_token.as_ref().map(|_| "[redacted]"))
            .field("apify_actor_id", &self.apify_actor_id)
            .field("scraper_timeout_secs", &self.scraper_timeout_secs)
            .field(
                "openrouter_api_key",
                &self.openrouter_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "anthropic_api_key",
                &self.anthropic_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("openrouter_model", &self.openrouter_model)
            .finish()
    }
}
