//! Wire types for the Apify v2 REST API.

use serde::{Deserialize, Serialize};

/// Envelope Apify wraps around every single-object response.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

/// Subset of an actor run object the source needs.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunData {
    pub id: String,
    pub status: String,
    pub default_dataset_id: String,
}

impl RunData {
    /// `true` once the run can no longer change state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status.as_str(),
            "SUCCEEDED" | "FAILED" | "ABORTED" | "TIMED-OUT"
        )
    }
}

/// Input document for the TikTok scraper actor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendSearchInput {
    pub search_queries: Vec<String>,
    pub results_per_page: usize,
    pub should_download_videos: bool,
    pub should_download_covers: bool,
}

impl TrendSearchInput {
    #[must_use]
    pub fn for_category(category: &str, limit: usize) -> Self {
        Self {
            search_queries: vec![category.to_owned()],
            results_per_page: limit,
            should_download_videos: false,
            should_download_covers: false,
        }
    }
}
