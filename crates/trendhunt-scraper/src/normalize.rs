//! Normalization from loosely-typed actor dataset items to
//! [`trendhunt_core::RawProduct`].
//!
//! Scalar parsing is delegated to [`crate::parse`]; this module maps field
//! names and decides which gaps are tolerable.

use rust_decimal::Decimal;
use serde_json::Value;
use trendhunt_core::RawProduct;

use crate::error::ApifyError;
use crate::parse::{parse_count, parse_price, parse_rating};

/// Maximum number of comments carried over as review excerpts.
pub const MAX_ITEM_COMMENTS: usize = 10;

/// Normalizes one dataset item into a [`RawProduct`] for `category`.
///
/// Missing optional fields default (price and counts to zero, URL to empty).
/// A field that is present but unreadable is an error, so a garbled item is
/// dropped rather than scored on fabricated numbers.
///
/// # Errors
///
/// Returns [`ApifyError::Normalization`] if the item is not an object, has no
/// title, or carries a price or count that cannot be parsed.
pub fn normalize_item(item: &Value, category: &str) -> Result<RawProduct, ApifyError> {
    let Value::Object(fields) = item else {
        return Err(invalid("", "item is not a JSON object"));
    };

    let product_id = match fields.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };

    let title = first_text(item, &["title", "desc"])
        .ok_or_else(|| invalid(&product_id, "item has no title or description"))?;

    let price = match fields.get("price") {
        None | Some(Value::Null) => Decimal::ZERO,
        Some(raw) => parse_price(raw).ok_or_else(|| invalid(&product_id, "unreadable price"))?,
    };

    let sales_count = match fields
        .get("playCount")
        .or_else(|| fields.get("salesCount"))
    {
        None | Some(Value::Null) => 0,
        Some(raw) => {
            parse_count(raw).ok_or_else(|| invalid(&product_id, "unreadable sales count"))?
        }
    };

    Ok(RawProduct {
        title,
        price,
        original_price: fields.get("originalPrice").and_then(parse_price),
        sales_count,
        rating_average: fields.get("rating").and_then(parse_rating),
        review_count: fields
            .get("commentCount")
            .and_then(parse_count)
            .unwrap_or(0),
        review_excerpts: comments(fields.get("comments")),
        category: category.to_owned(),
        source_url: first_text(item, &["webVideoUrl", "url"]).unwrap_or_default(),
        shop_name: item
            .pointer("/authorMeta/name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned),
        image_url: item
            .pointer("/covers/0")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_owned),
        product_id,
    })
}

fn invalid(item_id: &str, reason: &str) -> ApifyError {
    ApifyError::Normalization {
        item_id: item_id.to_owned(),
        reason: reason.to_owned(),
    }
}

/// Returns the first of `keys` holding a non-blank string, trimmed.
fn first_text(item: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| item.get(key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Comments arrive either as plain strings or as objects with a `text` field.
fn comments(raw: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(entries)) = raw else {
        return Vec::new();
    };
    entries
        .iter()
        .take(MAX_ITEM_COMMENTS)
        .filter_map(|entry| match entry {
            Value::String(s) => Some(s.as_str()),
            Value::Object(_) => entry.get("text").and_then(Value::as_str),
            _ => None,
        })
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
