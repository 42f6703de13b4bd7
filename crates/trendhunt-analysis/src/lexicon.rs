//! Keyword lexicons for mining review text without an AI call.

use trendhunt_core::QualitativeInsights;

/// Review keyword → emotional-trigger tag.
///
/// Keys are lowercase single words; punctuation around a word is ignored.
pub(crate) const TRIGGER_LEXICON: &[(&str, &str)] = &[
    ("love", "delight"),
    ("loved", "delight"),
    ("loves", "delight"),
    ("obsessed", "delight"),
    ("amazing", "delight"),
    ("awesome", "delight"),
    ("easy", "convenience"),
    ("easier", "convenience"),
    ("convenient", "convenience"),
    ("quick", "convenience"),
    ("fast", "convenience"),
    ("portable", "convenience"),
    ("gift", "gifting"),
    ("gifted", "gifting"),
    ("present", "gifting"),
    ("saves", "time-saving"),
    ("save", "time-saving"),
    ("minutes", "time-saving"),
    ("mess", "frustration relief"),
    ("messy", "frustration relief"),
    ("finally", "frustration relief"),
    ("organized", "order"),
    ("tidy", "order"),
    ("space", "order"),
    ("healthy", "health"),
    ("smoothies", "health"),
    ("everyone", "social proof"),
    ("viral", "social proof"),
    ("tiktok", "social proof"),
    ("cheaper", "value"),
    ("worth", "value"),
    ("deal", "value"),
];

/// Review keyword → quality warning.
pub(crate) const QUALITY_LEXICON: &[(&str, &str)] = &[
    ("broke", "Durability complaints in reviews"),
    ("broken", "Durability complaints in reviews"),
    ("cracked", "Durability complaints in reviews"),
    ("leak", "Leaking reported by buyers"),
    ("leaks", "Leaking reported by buyers"),
    ("leaked", "Leaking reported by buyers"),
    ("cheap", "Build quality concerns"),
    ("flimsy", "Build quality concerns"),
    ("smaller", "Size smaller than expected"),
    ("tiny", "Size smaller than expected"),
    ("refund", "Refund or return requests mentioned"),
    ("returned", "Refund or return requests mentioned"),
    ("stopped", "Stops working after a short time"),
    ("weak", "Weak performance reported"),
];

/// Mines triggers and quality warnings from `excerpts` by keyword lookup.
///
/// `problem_solved` is left empty: keywords alone cannot name a problem.
#[must_use]
pub fn heuristic_insights<'a>(excerpts: impl IntoIterator<Item = &'a str>) -> QualitativeInsights {
    let mut insights = QualitativeInsights::default();
    for excerpt in excerpts {
        for word in excerpt.split_whitespace() {
            let w = word
                .trim_matches(|c: char| !c.is_alphabetic())
                .to_lowercase();
            if let Some(&(_, tag)) = TRIGGER_LEXICON.iter().find(|(k, _)| *k == w) {
                insights.emotional_triggers.insert(tag.to_string());
            }
            if let Some(&(_, flag)) = QUALITY_LEXICON.iter().find(|(k, _)| *k == w) {
                insights.push_flag(flag);
            }
        }
    }
    insights
}
