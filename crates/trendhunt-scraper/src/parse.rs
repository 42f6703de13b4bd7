//! Lenient scalar parsing for scraped listing fields.
//!
//! Actor output is loosely typed: the same field can arrive as a JSON number,
//! a plain numeric string, or display text such as `"$24.99"` or `"15.4K sold"`.
//! Each helper accepts any of those shapes and returns `None` rather than an
//! error when nothing usable is found. See [`crate::normalize`] for how they
//! compose into a full [`trendhunt_core::RawProduct`].

use std::str::FromStr;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde_json::Value;

/// Parses a non-negative count such as sales or plays.
///
/// Accepts integers, finite non-negative floats (truncated), and strings with
/// thousands separators or a `K`/`M`/`B` suffix: `"1,234 sold"` → 1234,
/// `"15.4K"` → 15400.
#[must_use]
pub(crate) fn parse_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .and_then(Decimal::from_f64)
                .and_then(|d| d.trunc().to_u64())
        }),
        Value::String(s) => parse_count_text(s),
        _ => None,
    }
}

/// Parses a price into a non-negative [`Decimal`] rounded to cents.
///
/// Accepts JSON numbers and strings with a currency prefix or thousands
/// separators: `"$24.99"`, `"US$ 1,299.00"`.
#[must_use]
pub(crate) fn parse_price(value: &Value) -> Option<Decimal> {
    let price = match value {
        Value::Number(n) => n
            .as_u64()
            .map(Decimal::from)
            .or_else(|| n.as_f64().and_then(Decimal::from_f64)),
        Value::String(s) => {
            leading_number(s).and_then(|(digits, _)| Decimal::from_str(&digits).ok())
        }
        _ => None,
    }?;
    if price.is_sign_negative() {
        return None;
    }
    Some(price.round_dp(2))
}

/// Parses an average star rating. Values outside `0..=5` are rejected.
#[must_use]
pub(crate) fn parse_rating(value: &Value) -> Option<f64> {
    let rating = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    (rating.is_finite() && (0.0..=5.0).contains(&rating)).then_some(rating)
}

// ---------------------------------------------------------------------------
// Internal parsing helpers
// ---------------------------------------------------------------------------

fn parse_count_text(text: &str) -> Option<u64> {
    let (digits, rest) = leading_number(text)?;
    let base = Decimal::from_str(&digits).ok()?;
    let mut suffix = rest.trim_start().chars();
    let unit = suffix.next().map(|c| c.to_ascii_lowercase());
    // "5 bought" must not read as five billion.
    let standalone = !suffix.next().is_some_and(char::is_alphabetic);
    let multiplier = match unit {
        Some('k') if standalone => Decimal::from(1_000u64),
        Some('m') if standalone => Decimal::from(1_000_000u64),
        Some('b') if standalone => Decimal::from(1_000_000_000u64),
        _ => Decimal::ONE,
    };
    base.checked_mul(multiplier)?.trunc().to_u64()
}

/// Finds the first run of digits in `text` and returns it with separators
/// removed, together with the remainder of the string after the run.
///
/// A `-` anywhere before the digits is kept as a sign so that callers can
/// reject negative values.
fn leading_number(text: &str) -> Option<(String, &str)> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let negative = text[..start].contains('-');

    let mut digits = String::new();
    if negative {
        digits.push('-');
    }
    let mut seen_dot = false;
    let mut end = text.len();
    for (offset, c) in text[start..].char_indices() {
        match c {
            '0'..='9' => digits.push(c),
            ',' => {}
            '.' if !seen_dot => {
                seen_dot = true;
                digits.push('.');
            }
            _ => {
                end = start + offset;
                break;
            }
        }
    }
    let digits = digits.trim_end_matches('.').to_owned();
    Some((digits, &text[end..]))
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
