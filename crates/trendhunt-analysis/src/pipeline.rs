//! Pipeline orchestration: fetch → extract → mine → score → emit.
//!
//! Products are processed with bounded concurrency. Each product is an
//! isolated unit of work that returns its own outcome; a failure or panic in
//! one never touches its siblings. Results are merged after the barrier,
//! sorted by score, and emitted one by one.

use std::cmp::Reverse;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use trendhunt_ai::{AiClient, UsageSnapshot};
use trendhunt_core::{
    AppConfig, FetchError, ProductSink, ProductSource, RawProduct, RunSettings, ScoredProduct,
};
use uuid::Uuid;

use crate::error::{ItemProcessingError, PipelineError};
use crate::miner::{EmotionMiner, MinerSettings, MiningMode};
use crate::scorer::{ScoreWeights, ViralityScorer};
use crate::signals::{extract, SignalThresholds};
use crate::AI_UNAVAILABLE_FLAG;

/// AI calls a single product can make: one for mining, one for narrative.
const CALLS_PER_PRODUCT: u64 = 2;

/// Number of top products logged at the end of a run.
const TOP_PRODUCTS_LOGGED: usize = 3;

/// Phases of a run. Per-product failures during `Processing` are folded
/// into the summary's `failed` count rather than a separate terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Idle,
    Fetching,
    Processing,
    Finalizing,
    Done,
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunPhase::Idle => "idle",
            RunPhase::Fetching => "fetching",
            RunPhase::Processing => "processing",
            RunPhase::Finalizing => "finalizing",
            RunPhase::Done => "done",
        };
        f.write_str(s)
    }
}

/// Name and score of one of the best products in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopProduct {
    pub title: String,
    pub virality_score: u8,
}

/// What happened during one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub category: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub phase: RunPhase,
    pub fetched: usize,
    pub scored: usize,
    pub skipped_below_threshold: usize,
    pub failed: usize,
    pub emitted: usize,
    pub sink_failures: usize,
    pub ai_usage: UsageSnapshot,
    pub cancelled: bool,
    pub top_products: Vec<TopProduct>,
}

/// Everything the pipeline needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub category: String,
    pub max_products: usize,
    pub concurrency: usize,
    pub thresholds: SignalThresholds,
    pub miner: MinerSettings,
    pub weights: ScoreWeights,
}

impl PipelineSettings {
    /// Combines validated run input with process configuration.
    #[must_use]
    pub fn from_run(run: &RunSettings, app: &AppConfig) -> Self {
        Self {
            category: run.category.clone(),
            max_products: run.max_products,
            concurrency: run.concurrency,
            thresholds: SignalThresholds {
                min_sales_count: run.min_sales_count,
                max_review_sample: app.max_review_sample,
                ..SignalThresholds::default()
            },
            miner: MinerSettings {
                mode: if run.include_review_analysis {
                    MiningMode::Ai
                } else {
                    MiningMode::Heuristic
                },
                max_review_sample: app.max_review_sample,
                review_char_limit: app.review_char_limit,
            },
            weights: ScoreWeights::default(),
        }
    }
}

/// Upper bound on AI requests for a run of `max_products`, retries included.
#[must_use]
pub fn request_ceiling(max_products: usize, max_retries: u32) -> u64 {
    let products = u64::try_from(max_products).unwrap_or(u64::MAX);
    products
        .saturating_mul(CALLS_PER_PRODUCT)
        .saturating_mul(1 + u64::from(max_retries))
}

enum ItemOutcome {
    Scored(ScoredProduct),
    Skipped,
    Failed(ItemProcessingError),
}

pub struct Pipeline {
    source: Arc<dyn ProductSource>,
    sink: Arc<dyn ProductSink>,
    ai: AiClient,
    miner: EmotionMiner,
    scorer: ViralityScorer,
    settings: PipelineSettings,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        source: Arc<dyn ProductSource>,
        sink: Arc<dyn ProductSink>,
        ai: AiClient,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            miner: EmotionMiner::new(ai.clone(), settings.miner.clone()),
            scorer: ViralityScorer::new(ai.clone(), settings.weights),
            source,
            sink,
            ai,
            settings,
        }
    }

    /// Runs the pipeline to completion or until `cancel` fires.
    ///
    /// On cancellation in-flight products are abandoned; products already
    /// finalized are still emitted and the summary is marked cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Fetch`] when the source fails or yields no
    /// products. Per-product failures are counted, never returned.
    pub async fn run(&self, cancel: CancellationToken) -> Result<RunSummary, PipelineError> {
        let mut summary = RunSummary {
            run_id: Uuid::new_v4(),
            category: self.settings.category.clone(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            phase: RunPhase::Idle,
            fetched: 0,
            scored: 0,
            skipped_below_threshold: 0,
            failed: 0,
            emitted: 0,
            sink_failures: 0,
            ai_usage: UsageSnapshot::default(),
            cancelled: false,
            top_products: Vec::new(),
        };

        self.enter(&mut summary, RunPhase::Fetching);
        let products = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::warn!(run_id = %summary.run_id, "run cancelled while fetching");
                summary.cancelled = true;
                return Ok(self.finish(summary));
            }
            fetched = self.fetch() => fetched?,
        };
        summary.fetched = products.len();

        self.enter(&mut summary, RunPhase::Processing);
        let (mut scored, cancelled) = self.process_all(products, &cancel, &mut summary).await;
        summary.cancelled = cancelled;

        self.enter(&mut summary, RunPhase::Finalizing);
        scored.sort_by_key(|(index, product)| (Reverse(product.virality_score), *index));
        summary.scored = scored.len();
        summary.top_products = scored
            .iter()
            .take(TOP_PRODUCTS_LOGGED)
            .map(|(_, p)| TopProduct {
                title: p.title.clone(),
                virality_score: p.virality_score,
            })
            .collect();

        for (_, product) in &scored {
            match self.sink.emit(product).await {
                Ok(()) => summary.emitted += 1,
                Err(e) => {
                    summary.sink_failures += 1;
                    tracing::error!(product = %product.title, error = %e, "failed to emit product");
                }
            }
        }

        for (rank, top) in summary.top_products.iter().enumerate() {
            tracing::info!(
                rank = rank + 1,
                product = %top.title,
                virality_score = top.virality_score,
                "top product"
            );
        }

        Ok(self.finish(summary))
    }

    async fn fetch(&self) -> Result<Vec<RawProduct>, PipelineError> {
        let mut products = self
            .source
            .fetch_trending(&self.settings.category, self.settings.max_products)
            .await?;
        if products.len() > self.settings.max_products {
            tracing::debug!(
                received = products.len(),
                max_products = self.settings.max_products,
                "source returned more products than requested, ignoring the rest"
            );
            products.truncate(self.settings.max_products);
        }
        if products.is_empty() {
            return Err(FetchError::NoProducts {
                category: self.settings.category.clone(),
            }
            .into());
        }
        tracing::info!(
            source = self.source.name(),
            count = products.len(),
            "fetched trending products"
        );
        Ok(products)
    }

    /// Processes every product, returning `(fetch_index, product)` pairs and
    /// whether the run was cancelled before all products finished.
    async fn process_all(
        &self,
        products: Vec<RawProduct>,
        cancel: &CancellationToken,
        summary: &mut RunSummary,
    ) -> (Vec<(usize, ScoredProduct)>, bool) {
        let concurrency = self.settings.concurrency.max(1);
        let mut results = stream::iter(products.into_iter().enumerate())
            .map(|(index, product)| async move {
                let outcome = AssertUnwindSafe(self.process_one(&product))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic| {
                        ItemOutcome::Failed(ItemProcessingError::Panicked(panic_message(&*panic)))
                    });
                (index, product.title, outcome)
            })
            .buffer_unordered(concurrency);

        let mut scored = Vec::new();
        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    tracing::warn!(
                        finished = scored.len(),
                        "run cancelled, abandoning in-flight products"
                    );
                    return (scored, true);
                }
                next = results.next() => next,
            };
            let Some((index, title, outcome)) = next else {
                break;
            };
            match outcome {
                ItemOutcome::Scored(product) => scored.push((index, product)),
                ItemOutcome::Skipped => summary.skipped_below_threshold += 1,
                ItemOutcome::Failed(e) => {
                    summary.failed += 1;
                    tracing::error!(product = %title, error = %e, "product processing failed");
                }
            }
        }

        if summary.failed > 0 {
            tracing::warn!(
                failed = summary.failed,
                total = summary.fetched,
                "some products failed during processing"
            );
        }
        (scored, false)
    }

    async fn process_one(&self, product: &RawProduct) -> ItemOutcome {
        let signals = extract(product, &self.settings.thresholds);
        if signals.below_threshold {
            tracing::debug!(
                product = %product.title,
                sales_count = product.sales_count,
                min_sales_count = self.settings.thresholds.min_sales_count,
                "below sales threshold, skipping"
            );
            return ItemOutcome::Skipped;
        }

        let mut insights = match self.miner.mine(product, &signals).await {
            Ok(insights) => insights,
            Err(e) => return ItemOutcome::Failed(e),
        };
        let card = match self.scorer.score(product, &signals, &insights).await {
            Ok(card) => card,
            Err(e) => return ItemOutcome::Failed(e),
        };
        if !card.narrative_from_ai {
            insights.push_flag(AI_UNAVAILABLE_FLAG);
        }

        tracing::debug!(
            product = %product.title,
            virality_score = card.virality_score,
            "product scored"
        );
        ItemOutcome::Scored(ScoredProduct::assemble(
            product,
            &signals,
            insights,
            card.virality_score,
            card.narrative,
        ))
    }

    fn enter(&self, summary: &mut RunSummary, phase: RunPhase) {
        summary.phase = phase;
        tracing::info!(
            run_id = %summary.run_id,
            category = %self.settings.category,
            %phase,
            "run phase"
        );
    }

    fn finish(&self, mut summary: RunSummary) -> RunSummary {
        summary.ai_usage = self.ai.usage();
        summary.finished_at = Utc::now();
        self.enter(&mut summary, RunPhase::Done);
        tracing::info!(
            run_id = %summary.run_id,
            fetched = summary.fetched,
            scored = summary.scored,
            skipped = summary.skipped_below_threshold,
            failed = summary.failed,
            emitted = summary.emitted,
            ai_requests = summary.ai_usage.requests,
            cancelled = summary.cancelled,
            "run finished"
        );
        summary
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_ceiling_counts_retries() {
        assert_eq!(request_ceiling(10, 3), 80);
        assert_eq!(request_ceiling(1, 0), 2);
    }

    #[test]
    fn panic_message_reads_common_payloads() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(&*boxed), "boom");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(&*boxed), "bang");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(&*boxed), "unknown panic payload");
    }

    #[test]
    fn phases_display_lowercase() {
        assert_eq!(RunPhase::Finalizing.to_string(), "finalizing");
    }
}
