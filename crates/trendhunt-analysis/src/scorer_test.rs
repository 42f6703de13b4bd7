use super::*;
use rust_decimal::Decimal;

fn blender() -> RawProduct {
    RawProduct {
        product_id: "mock_001".to_owned(),
        title: "Portable Blender".to_owned(),
        price: Decimal::new(2499, 2),
        original_price: None,
        sales_count: 15_420,
        rating_average: Some(4.6),
        review_count: 2,
        review_excerpts: vec!["love it".to_owned(), "so easy".to_owned()],
        category: "Kitchen Gadgets".to_owned(),
        source_url: "https://shop.example/p/1".to_owned(),
        shop_name: None,
        image_url: None,
    }
}

fn signals(velocity: f64, rating: Option<f64>) -> Signals {
    Signals {
        sales_velocity_score: velocity,
        price_tier: PriceTier::Mid,
        rating_score: rating.unwrap_or(0.0),
        rating_missing: rating.is_none(),
        review_sample_size: 2,
        below_threshold: false,
        discount_percentage: None,
    }
}

fn insights_with(triggers: &[&str]) -> QualitativeInsights {
    QualitativeInsights {
        emotional_triggers: triggers.iter().map(|t| (*t).to_owned()).collect(),
        ..QualitativeInsights::default()
    }
}

#[test]
fn blender_without_triggers_scores_above_seventy() {
    let score = base_score(
        &signals(0.8376, Some(0.92)),
        &QualitativeInsights::default(),
        ScoreWeights::default(),
    );
    assert_eq!(score, 74);
}

#[test]
fn score_bounds_are_reachable() {
    let none = base_score(&signals(0.0, None), &insights_with(&[]), ScoreWeights::default());
    assert_eq!(none, 0);

    let all = base_score(
        &signals(1.0, Some(1.0)),
        &insights_with(&["a", "b", "c", "d", "e", "f"]),
        ScoreWeights::default(),
    );
    assert_eq!(all, 100);
}

#[test]
fn out_of_range_signals_are_clamped() {
    let score = base_score(
        &signals(7.5, Some(3.0)),
        &insights_with(&[]),
        ScoreWeights::default(),
    );
    assert_eq!(score, 85);

    let nan = base_score(&signals(f64::NAN, None), &insights_with(&[]), ScoreWeights::default());
    assert!(nan <= 100);
}

#[test]
fn triggers_saturate_at_five() {
    let five = base_score(
        &signals(0.5, Some(0.5)),
        &insights_with(&["a", "b", "c", "d", "e"]),
        ScoreWeights::default(),
    );
    let nine = base_score(
        &signals(0.5, Some(0.5)),
        &insights_with(&["a", "b", "c", "d", "e", "f", "g", "h", "i"]),
        ScoreWeights::default(),
    );
    assert_eq!(five, nine);
}

#[test]
fn weights_are_normalized_and_invalid_weights_fall_back() {
    let w = ScoreWeights {
        velocity: 2.0,
        rating: 1.0,
        triggers: 1.0,
    }
    .normalized();
    assert!((w.velocity - 0.5).abs() < f64::EPSILON);
    assert!((w.rating - 0.25).abs() < f64::EPSILON);

    let zero = ScoreWeights {
        velocity: 0.0,
        rating: 0.0,
        triggers: 0.0,
    };
    assert_eq!(zero.normalized(), ScoreWeights::default());

    let negative = ScoreWeights {
        velocity: -1.0,
        rating: 1.0,
        triggers: 1.0,
    };
    assert_eq!(negative.normalized(), ScoreWeights::default());
}

#[test]
fn template_narrative_is_never_empty() {
    let narrative = template_narrative(
        &blender(),
        &signals(0.8376, Some(0.92)),
        &QualitativeInsights::default(),
    );
    assert_eq!(
        narrative.why_winning,
        "High sales velocity (15420 units) with 4.6/5 average rating"
    );
    assert!(!narrative.marketing_angles.is_empty());
    assert!(narrative.marketing_angles.len() <= 5);
    assert!(!narrative.ad_hooks.is_empty());
    assert!(narrative.ad_hooks.len() <= 5);
    assert_eq!(
        narrative.target_audience,
        "Shoppers interested in Kitchen Gadgets looking for practical everyday upgrades"
    );
}

#[test]
fn template_skips_rating_when_missing() {
    let narrative = template_narrative(&blender(), &signals(0.2, None), &QualitativeInsights::default());
    assert_eq!(narrative.why_winning, "Early sales traction (15420 units)");
}

#[test]
fn template_uses_problem_and_triggers_when_known() {
    let mut insights = insights_with(&["delight"]);
    insights.problem_solved = "lumpy protein shakes".to_owned();
    let narrative = template_narrative(&blender(), &signals(0.8, Some(0.95)), &insights);
    assert!(narrative
        .marketing_angles
        .iter()
        .any(|a| a.contains("lumpy protein shakes")));
    assert!(narrative.marketing_angles.iter().any(|a| a.contains("delight")));
    assert!(narrative.marketing_angles.len() <= 5);
}

#[test]
fn narrative_prompt_carries_score_and_signals() {
    let prompt = narrative_prompt(
        &blender(),
        &signals(0.8376, Some(0.92)),
        &insights_with(&["delight"]),
        74,
    );
    assert!(prompt.contains("Virality Score: 74/100"));
    assert!(prompt.contains("Rating: 4.6/5"));
    assert!(prompt.contains("Emotional Triggers: delight"));
    assert!(prompt.contains("Problem Solved: undetermined"));
}
