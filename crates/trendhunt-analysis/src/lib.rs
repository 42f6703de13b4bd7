//! Product analysis for the trend-hunting pipeline.
//!
//! Extracts quantitative signals from scraped listings, mines review text
//! for emotional triggers, computes a deterministic virality score with an
//! AI-written marketing narrative, and orchestrates all of it per run.

pub mod error;
pub mod lexicon;
pub mod miner;
pub mod pipeline;
pub mod scorer;
pub mod signals;

/// Quality flag recorded when an AI step had to be replaced by a fallback.
pub const AI_UNAVAILABLE_FLAG: &str = "AI analysis unavailable";

pub use error::{ItemProcessingError, PipelineError};
pub use lexicon::heuristic_insights;
pub use miner::{EmotionMiner, MinerSettings, MiningMode};
pub use pipeline::{request_ceiling, Pipeline, PipelineSettings, RunPhase, RunSummary, TopProduct};
pub use scorer::{base_score, template_narrative, ScoreCard, ScoreWeights, ViralityScorer};
pub use signals::{extract, SignalThresholds};
