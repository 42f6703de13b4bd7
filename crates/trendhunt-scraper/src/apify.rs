use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::time::Instant;

use crate::error::ApifyError;
use crate::rate_limit::retry_with_backoff;
use crate::types::{ApiResponse, RunData};

pub const DEFAULT_BASE_URL: &str = "https://api.apify.com/v2";

/// Longest server-side wait Apify honours for `waitForFinish`.
const MAX_WAIT_FOR_FINISH_SECS: u64 = 60;

/// Error bodies are cut to this many characters before they land in logs.
const MAX_ERROR_BODY_CHARS: usize = 500;

/// HTTP client for the Apify v2 actor API.
///
/// Drives one actor run end to end: start it, long-poll until it reaches a
/// terminal status, then read its default dataset. Transient errors (429,
/// 5xx, network failures) are retried with exponential backoff.
#[derive(Clone)]
pub struct ApifyClient {
    client: Client,
    token: String,
    base_url: String,
    max_retries: u32,
    backoff_base_secs: u64,
    /// Upper bound on how long [`Self::wait_for_run`] keeps polling.
    run_timeout: Duration,
    /// Pause between polls when the server answers before the run finishes.
    poll_interval: Duration,
}

impl std::fmt::Debug for ApifyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApifyClient")
            .field("token", &"[redacted]")
            .field("base_url", &self.base_url)
            .field("max_retries", &self.max_retries)
            .field("run_timeout", &self.run_timeout)
            .finish_non_exhaustive()
    }
}

impl ApifyClient {
    /// Creates a client for `token` that gives up on a run after
    /// `run_timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`ApifyError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(token: impl Into<String>, run_timeout: Duration) -> Result<Self, ApifyError> {
        let client = Client::builder()
            // Long polls hold the connection for up to a minute.
            .timeout(Duration::from_secs(MAX_WAIT_FOR_FINISH_SECS + 30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("trendhunt/0.1 (product-analysis)")
            .build()?;
        Ok(Self {
            client,
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            max_retries: 3,
            backoff_base_secs: 2,
            run_timeout,
            poll_interval: Duration::from_secs(2),
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_secs: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_secs = backoff_base_secs;
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Starts an actor run. Returns as soon as Apify has accepted it.
    ///
    /// `actor_id` may use either the `user/name` or the `user~name` form.
    ///
    /// # Errors
    ///
    /// - [`ApifyError::Unauthorized`] when the token is rejected (not retried).
    /// - [`ApifyError::RateLimited`], [`ApifyError::UnexpectedStatus`] or
    ///   [`ApifyError::Http`] after all retries are exhausted.
    /// - [`ApifyError::Deserialize`] when the run object is malformed.
    pub async fn start_run<I: Serialize + Sync>(
        &self,
        actor_id: &str,
        input: &I,
    ) -> Result<RunData, ApifyError> {
        let url = format!("{}/acts/{}/runs", self.base_url, actor_id.replace('/', "~"));
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.clone();
            async move {
                let response = self
                    .client
                    .post(&url)
                    .bearer_auth(&self.token)
                    .json(input)
                    .send()
                    .await?;
                let response = check_status(response, &url).await?;
                let envelope: ApiResponse<RunData> =
                    decode(response, &format!("run started for actor {actor_id}")).await?;
                Ok(envelope.data)
            }
        })
        .await
    }

    /// Polls a run until it reaches a terminal status.
    ///
    /// Each poll asks Apify to hold the request open for up to a minute
    /// (`waitForFinish`), so a healthy run costs few round trips.
    ///
    /// # Errors
    ///
    /// - [`ApifyError::RunFailed`] when the run ends `FAILED`, `ABORTED` or
    ///   `TIMED-OUT`.
    /// - [`ApifyError::RunTimeout`] when the run is still going after the
    ///   client's run timeout.
    /// - Any request error from a poll, after retries.
    pub async fn wait_for_run(&self, run_id: &str) -> Result<RunData, ApifyError> {
        let started = Instant::now();
        loop {
            let remaining = self.run_timeout.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                return Err(ApifyError::RunTimeout {
                    run_id: run_id.to_owned(),
                    waited_secs: self.run_timeout.as_secs(),
                });
            }
            let wait_secs = remaining.as_secs().min(MAX_WAIT_FOR_FINISH_SECS);
            let url = format!(
                "{}/actor-runs/{run_id}?waitForFinish={wait_secs}",
                self.base_url
            );

            let run = retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
                let url = url.clone();
                async move {
                    let response = self
                        .client
                        .get(&url)
                        .bearer_auth(&self.token)
                        .send()
                        .await?;
                    let response = check_status(response, &url).await?;
                    let envelope: ApiResponse<RunData> =
                        decode(response, &format!("actor run {run_id}")).await?;
                    Ok(envelope.data)
                }
            })
            .await?;

            match run.status.as_str() {
                "SUCCEEDED" => return Ok(run),
                _ if run.is_terminal() => {
                    return Err(ApifyError::RunFailed {
                        run_id: run.id,
                        status: run.status,
                    });
                }
                _ => {
                    tracing::debug!(run_id, status = %run.status, "actor run still in progress");
                    let pause = self
                        .poll_interval
                        .min(self.run_timeout.saturating_sub(started.elapsed()));
                    tokio::time::sleep(pause).await;
                }
            }
        }
    }

    /// Reads up to `limit` items from a dataset as untyped JSON.
    ///
    /// # Errors
    ///
    /// Returns a request error after retries, or [`ApifyError::Deserialize`]
    /// when the body is not a JSON array.
    pub async fn get_dataset_items(
        &self,
        dataset_id: &str,
        limit: usize,
    ) -> Result<Vec<Value>, ApifyError> {
        let url = format!(
            "{}/datasets/{dataset_id}/items?format=json&clean=true&limit={limit}",
            self.base_url
        );
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.clone();
            async move {
                let response = self
                    .client
                    .get(&url)
                    .bearer_auth(&self.token)
                    .send()
                    .await?;
                let response = check_status(response, &url).await?;
                decode(response, &format!("items of dataset {dataset_id}")).await
            }
        })
        .await
    }

    /// Runs an actor end to end: start, wait, then fetch up to `limit`
    /// dataset items.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Self::start_run`], [`Self::wait_for_run`]
    /// or [`Self::get_dataset_items`].
    pub async fn run_actor<I: Serialize + Sync>(
        &self,
        actor_id: &str,
        input: &I,
        limit: usize,
    ) -> Result<Vec<Value>, ApifyError> {
        let run = self.start_run(actor_id, input).await?;
        tracing::info!(actor_id, run_id = %run.id, "actor run started, polling for completion");

        let completed = self.wait_for_run(&run.id).await?;
        tracing::info!(
            run_id = %completed.id,
            dataset_id = %completed.default_dataset_id,
            "actor run completed, fetching dataset"
        );

        let items = self
            .get_dataset_items(&completed.default_dataset_id, limit)
            .await?;
        tracing::info!(count = items.len(), "fetched dataset items");
        Ok(items)
    }
}

async fn check_status(response: Response, url: &str) -> Result<Response, ApifyError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ApifyError::Unauthorized {
            status: status.as_u16(),
        }),
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(60);
            Err(ApifyError::RateLimited { retry_after_secs })
        }
        _ => {
            let body = response.text().await.unwrap_or_default();
            Err(ApifyError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            })
        }
    }
}

async fn decode<T: DeserializeOwned>(response: Response, context: &str) -> Result<T, ApifyError> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|source| ApifyError::Deserialize {
        context: context.to_owned(),
        source,
    })
}
