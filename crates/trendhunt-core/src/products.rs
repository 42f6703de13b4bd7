use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A product listing as yielded by the scraping collaborator.
///
/// Immutable once created; lives for a single pipeline pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawProduct {
    /// Storefront product identifier, empty when the source did not expose one.
    #[serde(default)]
    pub product_id: String,
    pub title: String,
    pub price: Decimal,
    /// List price before discount, if the storefront shows one.
    #[serde(default)]
    pub original_price: Option<Decimal>,
    pub sales_count: u64,
    /// Average star rating on a 0–5 scale.
    #[serde(default)]
    pub rating_average: Option<f64>,
    #[serde(default)]
    pub review_count: u64,
    /// Review snippets in the order the storefront listed them.
    #[serde(default)]
    pub review_excerpts: Vec<String>,
    pub category: String,
    pub source_url: String,
    #[serde(default)]
    pub shop_name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Coarse price bucket used for positioning copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceTier {
    Budget,
    Mid,
    Premium,
}

impl std::fmt::Display for PriceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceTier::Budget => write!(f, "budget"),
            PriceTier::Mid => write!(f, "mid"),
            PriceTier::Premium => write!(f, "premium"),
        }
    }
}

/// Canonical quantitative features derived from exactly one [`RawProduct`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signals {
    /// Saturating transform of the sales count, in `[0.0, 1.0]`.
    pub sales_velocity_score: f64,
    pub price_tier: PriceTier,
    /// `rating_average / 5`, or `0.0` when the product has no ratings.
    pub rating_score: f64,
    pub rating_missing: bool,
    /// Number of non-empty review excerpts, capped at the configured sample size.
    pub review_sample_size: usize,
    /// `true` when the sales count is under the run's minimum; such products
    /// are skipped before any AI cost is incurred.
    pub below_threshold: bool,
    /// Percentage off the original price, rounded to one decimal.
    pub discount_percentage: Option<f64>,
}

/// Text- and tag-level findings mined from review content.
///
/// Fields may be empty when mining was skipped or degraded; the value itself
/// is always present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QualitativeInsights {
    pub emotional_triggers: BTreeSet<String>,
    /// Empty string means the problem could not be determined.
    pub problem_solved: String,
    pub quality_flags: Vec<String>,
}

impl QualitativeInsights {
    /// Appends `flag` unless an identical flag is already recorded.
    pub fn push_flag(&mut self, flag: impl Into<String>) {
        let flag = flag.into();
        if !self.quality_flags.contains(&flag) {
            self.quality_flags.push(flag);
        }
    }
}

/// Narrative marketing fields produced by the virality scorer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Narrative {
    pub why_winning: String,
    pub marketing_angles: Vec<String>,
    pub ad_hooks: Vec<String>,
    pub target_audience: String,
}

/// Final output unit handed to the persistence collaborator.
///
/// Field names follow the published dataset record shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredProduct {
    pub product_id: String,
    #[serde(rename = "product_title")]
    pub title: String,
    #[serde(rename = "product_url")]
    pub source_url: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub original_price: Option<Decimal>,
    pub discount_percentage: Option<f64>,
    pub sales_count: u64,
    #[serde(rename = "rating")]
    pub rating_average: Option<f64>,
    pub review_count: u64,
    pub shop_name: Option<String>,
    pub category: String,
    pub image_url: Option<String>,
    pub virality_score: u8,
    pub why_winning: String,
    pub problem_solved: String,
    pub emotional_triggers: Vec<String>,
    pub marketing_angles: Vec<String>,
    pub ad_hooks: Vec<String>,
    pub quality_flags: Vec<String>,
    pub target_audience: String,
}

impl ScoredProduct {
    /// Combines a product with its derived signals, insights and narrative.
    #[must_use]
    pub fn assemble(
        raw: &RawProduct,
        signals: &Signals,
        insights: QualitativeInsights,
        virality_score: u8,
        narrative: Narrative,
    ) -> Self {
        Self {
            product_id: raw.product_id.clone(),
            title: raw.title.clone(),
            source_url: raw.source_url.clone(),
            price: raw.price,
            original_price: raw.original_price,
            discount_percentage: signals.discount_percentage,
            sales_count: raw.sales_count,
            rating_average: raw.rating_average,
            review_count: raw.review_count,
            shop_name: raw.shop_name.clone(),
            category: raw.category.clone(),
            image_url: raw.image_url.clone(),
            virality_score: virality_score.min(100),
            why_winning: narrative.why_winning,
            problem_solved: insights.problem_solved,
            emotional_triggers: insights.emotional_triggers.into_iter().collect(),
            marketing_angles: narrative.marketing_angles,
            ad_hooks: narrative.ad_hooks,
            quality_flags: insights.quality_flags,
            target_audience: narrative.target_audience,
        }
    }
}
