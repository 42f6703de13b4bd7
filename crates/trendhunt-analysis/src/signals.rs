//! Signal extraction: raw scrape record in, canonical features out.
//!
//! Pure and total. Every oddity in the input (missing rating, NaN rating,
//! blank review snippets, zero list price) maps to a well-defined value.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use trendhunt_core::{PriceTier, RawProduct, Signals};

/// Sales count at which the velocity score reaches `1.0`.
pub const DEFAULT_SALES_SATURATION: u64 = 100_000;
pub const DEFAULT_MAX_REVIEW_SAMPLE: usize = 20;

/// Tunables for [`extract`].
#[derive(Debug, Clone, PartialEq)]
pub struct SignalThresholds {
    pub sales_saturation: u64,
    /// Products selling fewer units are marked below threshold.
    pub min_sales_count: u64,
    /// Prices strictly below this are [`PriceTier::Budget`].
    pub budget_below: Decimal,
    /// Prices strictly above this are [`PriceTier::Premium`].
    pub premium_above: Decimal,
    pub max_review_sample: usize,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            sales_saturation: DEFAULT_SALES_SATURATION,
            min_sales_count: 100,
            budget_below: Decimal::from(15),
            premium_above: Decimal::from(50),
            max_review_sample: DEFAULT_MAX_REVIEW_SAMPLE,
        }
    }
}

/// Derives [`Signals`] from one product.
#[must_use]
pub fn extract(product: &RawProduct, thresholds: &SignalThresholds) -> Signals {
    let rating = product
        .rating_average
        .filter(|r| r.is_finite())
        .map(|r| (r / 5.0).clamp(0.0, 1.0));

    Signals {
        sales_velocity_score: sales_velocity(product.sales_count, thresholds.sales_saturation),
        price_tier: price_tier(product.price, thresholds),
        rating_score: rating.unwrap_or(0.0),
        rating_missing: rating.is_none(),
        review_sample_size: usable_excerpts(product, thresholds.max_review_sample).count(),
        below_threshold: product.sales_count < thresholds.min_sales_count,
        discount_percentage: discount_percentage(product.price, product.original_price),
    }
}

/// Non-blank review excerpts in listing order, at most `max`.
pub fn usable_excerpts(product: &RawProduct, max: usize) -> impl Iterator<Item = &str> {
    product
        .review_excerpts
        .iter()
        .map(|e| e.trim())
        .filter(|e| !e.is_empty())
        .take(max)
}

/// `ln(1 + sales) / ln(1 + saturation)`, capped at `1.0`.
#[allow(clippy::cast_precision_loss)]
fn sales_velocity(sales: u64, saturation: u64) -> f64 {
    let saturation = saturation.max(1) as f64;
    let score = (sales as f64).ln_1p() / saturation.ln_1p();
    score.clamp(0.0, 1.0)
}

fn price_tier(price: Decimal, thresholds: &SignalThresholds) -> PriceTier {
    if price < thresholds.budget_below {
        PriceTier::Budget
    } else if price > thresholds.premium_above {
        PriceTier::Premium
    } else {
        PriceTier::Mid
    }
}

fn discount_percentage(price: Decimal, original: Option<Decimal>) -> Option<f64> {
    let original = original.filter(|o| *o > price && *o > Decimal::ZERO)?;
    ((Decimal::ONE - price / original) * Decimal::ONE_HUNDRED)
        .round_dp(1)
        .to_f64()
}
