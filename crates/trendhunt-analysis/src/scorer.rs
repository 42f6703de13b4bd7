//! Virality scoring: a deterministic 0–100 score plus marketing narrative.
//!
//! The numeric score never depends on the model. The narrative call is best
//! effort; every field it fails to supply falls back to a template built from
//! the product's own signals.

use schemars::JsonSchema;
use serde::Deserialize;
use trendhunt_ai::{AiClient, Completion, SchemaHint};
use trendhunt_core::{Narrative, PriceTier, QualitativeInsights, RawProduct, Signals};

use crate::error::ItemProcessingError;
use crate::miner::{MAX_FIELD_CHARS, MAX_LIST_ITEMS};

/// Trigger count at which the trigger component saturates.
const TRIGGER_SATURATION: usize = 5;

const SYSTEM_PROMPT: &str = "You are an expert e-commerce analyst and direct-response \
copywriter for social commerce. Given a product's sales signals and review insights, \
explain why it is trending and propose marketing angles, short video ad hooks and the \
ideal target audience. Respond only with a JSON object.";

/// Relative weight of each base-score component.
///
/// Weights are normalized to sum to `1.0` before use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub velocity: f64,
    pub rating: f64,
    pub triggers: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            velocity: 0.55,
            rating: 0.30,
            triggers: 0.15,
        }
    }
}

impl ScoreWeights {
    /// Returns the weights scaled to sum to `1.0`, or the defaults when the
    /// given weights are negative, non-finite, or all zero.
    #[must_use]
    pub fn normalized(self) -> Self {
        let parts = [self.velocity, self.rating, self.triggers];
        let sum: f64 = parts.iter().sum();
        if parts.iter().any(|w| !w.is_finite() || *w < 0.0) || sum <= 0.0 || !sum.is_finite() {
            return Self::default();
        }
        Self {
            velocity: self.velocity / sum,
            rating: self.rating / sum,
            triggers: self.triggers / sum,
        }
    }
}

/// Result of [`ViralityScorer::score`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreCard {
    pub virality_score: u8,
    pub narrative: Narrative,
    /// `false` when the narrative call failed and every field is templated.
    pub narrative_from_ai: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[allow(dead_code)]
struct NarrativeDraft {
    /// Two to three sentences on why the product is trending.
    why_winning: String,
    /// Up to five marketing angles.
    marketing_angles: Vec<String>,
    /// Up to five short video ad hooks.
    ad_hooks: Vec<String>,
    /// Description of the ideal customer.
    target_audience: String,
}

/// Deterministic base score in `[0, 100]`.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn base_score(signals: &Signals, insights: &QualitativeInsights, weights: ScoreWeights) -> u8 {
    let w = weights.normalized();
    let triggers =
        insights.emotional_triggers.len().min(TRIGGER_SATURATION) as f64 / TRIGGER_SATURATION as f64;
    let combined = w.velocity * signals.sales_velocity_score.clamp(0.0, 1.0)
        + w.rating * signals.rating_score.clamp(0.0, 1.0)
        + w.triggers * triggers;
    let scaled = (combined * 100.0).round();
    if !scaled.is_finite() {
        return 0;
    }
    scaled.clamp(0.0, 100.0) as u8
}

#[derive(Debug, Clone)]
pub struct ViralityScorer {
    ai: AiClient,
    weights: ScoreWeights,
    schema: SchemaHint,
}

impl ViralityScorer {
    #[must_use]
    pub fn new(ai: AiClient, weights: ScoreWeights) -> Self {
        Self {
            ai,
            weights: weights.normalized(),
            schema: SchemaHint::of::<NarrativeDraft>(),
        }
    }

    /// Scores one product and writes its marketing narrative.
    ///
    /// # Errors
    ///
    /// Returns [`ItemProcessingError::AiBudget`] when the AI budget refuses
    /// the narrative call. Every other AI failure falls back to templates.
    pub async fn score(
        &self,
        product: &RawProduct,
        signals: &Signals,
        insights: &QualitativeInsights,
    ) -> Result<ScoreCard, ItemProcessingError> {
        let virality_score = base_score(signals, insights, self.weights);
        let prompt = narrative_prompt(product, signals, insights, virality_score);

        match self.ai.complete(SYSTEM_PROMPT, &prompt, &self.schema).await {
            Ok(completion) => Ok(ScoreCard {
                virality_score,
                narrative: merge_narrative(&completion, product, signals, insights),
                narrative_from_ai: true,
            }),
            Err(e) if e.is_budget_failure() => Err(ItemProcessingError::AiBudget(e)),
            Err(e) => {
                tracing::warn!(
                    product = %product.title,
                    error = %e,
                    "narrative generation failed, using templates"
                );
                Ok(ScoreCard {
                    virality_score,
                    narrative: template_narrative(product, signals, insights),
                    narrative_from_ai: false,
                })
            }
        }
    }
}

/// Takes each field from the model when valid, from the template otherwise.
fn merge_narrative(
    completion: &Completion,
    product: &RawProduct,
    signals: &Signals,
    insights: &QualitativeInsights,
) -> Narrative {
    let angles = completion.text_list("marketing_angles", MAX_LIST_ITEMS, MAX_FIELD_CHARS);
    let hooks = completion.text_list("ad_hooks", MAX_LIST_ITEMS, MAX_FIELD_CHARS);
    Narrative {
        why_winning: completion
            .text("why_winning", MAX_FIELD_CHARS)
            .unwrap_or_else(|| why_winning_template(product, signals)),
        marketing_angles: if angles.is_empty() {
            marketing_angles_template(product, signals, insights)
        } else {
            angles
        },
        ad_hooks: if hooks.is_empty() {
            ad_hooks_template(product, signals)
        } else {
            hooks
        },
        target_audience: completion
            .text("target_audience", MAX_FIELD_CHARS)
            .unwrap_or_else(|| target_audience_template(product, signals)),
    }
}

/// Fully templated narrative used when the model is unavailable.
#[must_use]
pub fn template_narrative(
    product: &RawProduct,
    signals: &Signals,
    insights: &QualitativeInsights,
) -> Narrative {
    Narrative {
        why_winning: why_winning_template(product, signals),
        marketing_angles: marketing_angles_template(product, signals, insights),
        ad_hooks: ad_hooks_template(product, signals),
        target_audience: target_audience_template(product, signals),
    }
}

fn why_winning_template(product: &RawProduct, signals: &Signals) -> String {
    let velocity = if signals.sales_velocity_score >= 0.7 {
        "High sales velocity"
    } else if signals.sales_velocity_score >= 0.4 {
        "Steady sales"
    } else {
        "Early sales traction"
    };
    let mut text = format!("{velocity} ({} units)", product.sales_count);
    if !signals.rating_missing {
        text.push_str(&format!(
            " with {:.1}/5 average rating",
            signals.rating_score * 5.0
        ));
    }
    if let Some(discount) = signals.discount_percentage {
        text.push_str(&format!(", {discount:.0}% below list price"));
    }
    text
}

fn marketing_angles_template(
    product: &RawProduct,
    signals: &Signals,
    insights: &QualitativeInsights,
) -> Vec<String> {
    let mut angles = vec![match signals.price_tier {
        PriceTier::Budget => "Impulse-buy price that needs no justification".to_string(),
        PriceTier::Mid => "Affordable upgrade for an everyday routine".to_string(),
        PriceTier::Premium => "Premium build that is worth the investment".to_string(),
    }];
    if !insights.problem_solved.is_empty() {
        angles.push(format!("Solves a real problem: {}", insights.problem_solved));
    }
    if !signals.rating_missing && signals.rating_score >= 0.9 {
        angles.push("Top-rated by verified buyers".to_string());
    }
    angles.push(format!("Proven demand: {} already sold", product.sales_count));
    if let Some(trigger) = insights.emotional_triggers.iter().next() {
        angles.push(format!("Lean into {trigger} in the creative"));
    }
    angles.truncate(MAX_LIST_ITEMS);
    angles
}

fn ad_hooks_template(product: &RawProduct, signals: &Signals) -> Vec<String> {
    let mut hooks = vec![
        format!("POV: you finally found the {} everyone is talking about", product.title),
        format!("{} people already bought this. Here's why.", product.sales_count),
    ];
    if let Some(discount) = signals.discount_percentage {
        hooks.push(format!("It's {discount:.0}% off right now and I'm not gatekeeping"));
    }
    hooks.push(format!(
        "The {} find I didn't know I needed",
        product.category.to_lowercase()
    ));
    hooks.truncate(MAX_LIST_ITEMS);
    hooks
}

fn target_audience_template(product: &RawProduct, signals: &Signals) -> String {
    let looking_for = match signals.price_tier {
        PriceTier::Budget => "low-cost impulse buys",
        PriceTier::Mid => "practical everyday upgrades",
        PriceTier::Premium => "high-end, long-lasting products",
    };
    format!(
        "Shoppers interested in {} looking for {looking_for}",
        product.category
    )
}

fn narrative_prompt(
    product: &RawProduct,
    signals: &Signals,
    insights: &QualitativeInsights,
    score: u8,
) -> String {
    let rating = if signals.rating_missing {
        "N/A".to_string()
    } else {
        format!("{:.1}/5", signals.rating_score * 5.0)
    };
    let triggers = if insights.emotional_triggers.is_empty() {
        "none identified".to_string()
    } else {
        insights
            .emotional_triggers
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    };
    let problem = if insights.problem_solved.is_empty() {
        "undetermined"
    } else {
        insights.problem_solved.as_str()
    };
    format!(
        "Product Title: {title}\n\
         Price: ${price} ({tier} tier)\n\
         Sales Count: {sales}\n\
         Rating: {rating}\n\
         Review Count: {reviews}\n\
         Category: {category}\n\
         Virality Score: {score}/100\n\
         Emotional Triggers: {triggers}\n\
         Problem Solved: {problem}\n\n\
         Explain why this product is winning (2-3 sentences), give up to 5 marketing \
         angles, up to 5 video ad hooks, and describe the target audience.",
        title = product.title,
        price = product.price,
        tier = signals.price_tier,
        sales = product.sales_count,
        reviews = product.review_count,
        category = product.category,
    )
}

#[cfg(test)]
#[path = "scorer_test.rs"]
mod tests;
