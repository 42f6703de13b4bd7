//! Emotion and pain-point mining over review excerpts.

use schemars::JsonSchema;
use serde::Deserialize;
use trendhunt_ai::{AiClient, SchemaHint};
use trendhunt_core::{QualitativeInsights, RawProduct, Signals};

use crate::error::ItemProcessingError;
use crate::lexicon::heuristic_insights;
use crate::signals::usable_excerpts;
use crate::AI_UNAVAILABLE_FLAG;

pub const DEFAULT_REVIEW_CHAR_LIMIT: usize = 280;

/// Longest string accepted in any structured field of a model reply.
pub(crate) const MAX_FIELD_CHARS: usize = 500;
pub(crate) const MAX_LIST_ITEMS: usize = 5;

const SYSTEM_PROMPT: &str = "You are an expert e-commerce analyst specializing in viral \
product identification for social commerce. You read customer reviews and identify the \
emotional triggers that drive purchases, the main problem the product solves, and any \
quality concerns buyers raise. Respond only with a JSON object.";

/// Shape of the reply requested from the model.
#[derive(Debug, Deserialize, JsonSchema)]
#[allow(dead_code)]
struct ReviewFindings {
    /// Short lowercase tags such as "delight" or "convenience".
    emotional_triggers: Vec<String>,
    /// The main pain point the product addresses, one sentence.
    problem_solved: String,
    /// Potential quality issues raised in the reviews.
    quality_flags: Vec<String>,
}

/// How review text is turned into insights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiningMode {
    /// One AI call per product with reviews.
    Ai,
    /// Keyword lexicon only, no AI cost.
    Heuristic,
}

#[derive(Debug, Clone)]
pub struct MinerSettings {
    pub mode: MiningMode,
    pub max_review_sample: usize,
    /// Per-excerpt character cap applied when building the prompt.
    pub review_char_limit: usize,
}

impl Default for MinerSettings {
    fn default() -> Self {
        Self {
            mode: MiningMode::Ai,
            max_review_sample: crate::signals::DEFAULT_MAX_REVIEW_SAMPLE,
            review_char_limit: DEFAULT_REVIEW_CHAR_LIMIT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmotionMiner {
    ai: AiClient,
    settings: MinerSettings,
    schema: SchemaHint,
}

impl EmotionMiner {
    #[must_use]
    pub fn new(ai: AiClient, settings: MinerSettings) -> Self {
        Self {
            ai,
            settings,
            schema: SchemaHint::of::<ReviewFindings>(),
        }
    }

    /// Mines qualitative insights for one product.
    ///
    /// Products without usable reviews get default insights and no AI call.
    /// Any AI failure other than a budget refusal degrades to default
    /// insights flagged with [`AI_UNAVAILABLE_FLAG`].
    ///
    /// # Errors
    ///
    /// Returns [`ItemProcessingError::AiBudget`] when the AI budget refuses
    /// the call.
    pub async fn mine(
        &self,
        product: &RawProduct,
        signals: &Signals,
    ) -> Result<QualitativeInsights, ItemProcessingError> {
        if signals.review_sample_size == 0 {
            return Ok(QualitativeInsights::default());
        }
        let sample = signals.review_sample_size.min(self.settings.max_review_sample);
        let excerpts = usable_excerpts(product, sample);

        if self.settings.mode == MiningMode::Heuristic {
            return Ok(heuristic_insights(excerpts));
        }

        let prompt = self.build_prompt(product, excerpts);
        match self.ai.complete(SYSTEM_PROMPT, &prompt, &self.schema).await {
            Ok(completion) => {
                let mut insights = QualitativeInsights {
                    emotional_triggers: completion
                        .text_list("emotional_triggers", MAX_LIST_ITEMS, MAX_FIELD_CHARS)
                        .into_iter()
                        .map(|t| t.to_lowercase())
                        .collect(),
                    problem_solved: completion
                        .text("problem_solved", MAX_FIELD_CHARS)
                        .unwrap_or_default(),
                    quality_flags: Vec::new(),
                };
                for flag in completion.text_list("quality_flags", MAX_LIST_ITEMS, MAX_FIELD_CHARS) {
                    insights.push_flag(flag);
                }
                Ok(insights)
            }
            Err(e) if e.is_budget_failure() => Err(ItemProcessingError::AiBudget(e)),
            Err(e) => {
                tracing::warn!(
                    product = %product.title,
                    error = %e,
                    "review mining failed, continuing without insights"
                );
                let mut insights = QualitativeInsights::default();
                insights.push_flag(AI_UNAVAILABLE_FLAG);
                Ok(insights)
            }
        }
    }

    fn build_prompt<'a>(
        &self,
        product: &RawProduct,
        excerpts: impl Iterator<Item = &'a str>,
    ) -> String {
        let mut prompt = format!(
            "Product Title: {}\nCategory: {}\n\nRecent Reviews:\n",
            product.title, product.category
        );
        for excerpt in excerpts {
            prompt.push_str(&format!(
                "- {}\n",
                truncate_to_char_boundary(excerpt, self.settings.review_char_limit)
            ));
        }
        prompt.push_str(
            "\nIdentify the emotional triggers in these reviews, the problem the product \
             solves, and any quality concerns.",
        );
        prompt
    }
}

/// Longest prefix of `s` with at most `max_chars` characters.
pub(crate) fn truncate_to_char_boundary(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_respects_multibyte_chars() {
        assert_eq!(truncate_to_char_boundary("héllo wörld", 4), "héll");
        assert_eq!(truncate_to_char_boundary("short", 280), "short");
        assert_eq!(truncate_to_char_boundary("🙂🙂🙂", 2), "🙂🙂");
        assert_eq!(truncate_to_char_boundary("abc", 0), "");
    }

    #[test]
    fn review_findings_schema_lists_all_fields() {
        let hint = SchemaHint::of::<ReviewFindings>();
        let props = &hint.schema["properties"];
        assert!(props["emotional_triggers"].is_object());
        assert!(props["problem_solved"].is_object());
        assert!(props["quality_flags"].is_object());
    }
}
