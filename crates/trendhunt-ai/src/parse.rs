//! Turning free-form model output into a JSON object.
//!
//! Models asked for JSON still wrap it in markdown fences, prepend chatter,
//! or trail off. Parsing runs in two stages: a strict parse of the whole
//! (fence-stripped) body, then a scan for the first balanced `{...}` object
//! embedded in surrounding prose.

use serde_json::{Map, Value};

use crate::error::AiError;
use crate::provider::TokenUsage;

/// Which stage produced a [`Completion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// The whole body was a JSON object.
    Structured,
    /// A JSON object was recovered from surrounding text.
    Extracted,
}

/// A parsed model response.
#[derive(Debug, Clone)]
pub struct Completion {
    pub fields: Map<String, Value>,
    pub mode: ParseMode,
    pub usage: TokenUsage,
}

impl Completion {
    /// Returns a trimmed, non-empty string field of at most `max_chars`
    /// characters.
    ///
    /// Strings that look like serialized JSON are rejected so that a raw
    /// blob never ends up in a typed field.
    #[must_use]
    pub fn text(&self, key: &str, max_chars: usize) -> Option<String> {
        self.fields
            .get(key)
            .and_then(Value::as_str)
            .and_then(|s| clean_text(s, max_chars))
    }

    /// Returns a string-list field, trimmed, de-duplicated and capped at
    /// `max_items`. Non-string entries are skipped; a missing or non-array
    /// field yields an empty list.
    #[must_use]
    pub fn text_list(&self, key: &str, max_items: usize, max_chars: usize) -> Vec<String> {
        let Some(items) = self.fields.get(key).and_then(Value::as_array) else {
            return Vec::new();
        };
        let mut out: Vec<String> = Vec::new();
        for item in items {
            if out.len() >= max_items {
                break;
            }
            if let Some(text) = item.as_str().and_then(|s| clean_text(s, max_chars)) {
                if !out.iter().any(|existing| existing.eq_ignore_ascii_case(&text)) {
                    out.push(text);
                }
            }
        }
        out
    }
}

fn clean_text(raw: &str, max_chars: usize) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.chars().count() > max_chars {
        return None;
    }
    if trimmed.starts_with('{') || trimmed.starts_with('[') || trimmed.starts_with("```") {
        return None;
    }
    Some(trimmed.to_string())
}

/// Strip markdown code fences from a response.
#[must_use]
pub fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Parses model output into a JSON object, strict first, then best effort.
///
/// # Errors
///
/// Returns [`AiError::Parse`] when no JSON object can be recovered.
pub fn parse_object(text: &str) -> Result<(Map<String, Value>, ParseMode), AiError> {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(strip_code_blocks(text)) {
        return Ok((map, ParseMode::Structured));
    }
    extract_embedded_object(text)
        .map(|map| (map, ParseMode::Extracted))
        .ok_or_else(|| {
            let preview: String = text.chars().take(80).collect();
            AiError::Parse(format!("no JSON object found in response: {preview:?}"))
        })
}

/// Finds the first balanced `{...}` span that parses as a JSON object.
fn extract_embedded_object(text: &str) -> Option<Map<String, Value>> {
    let bytes = text.as_bytes();
    let mut start = 0;
    while let Some(offset) = text[start..].find('{') {
        let open = start + offset;
        if let Some(close) = matching_brace(bytes, open) {
            if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&text[open..=close]) {
                return Some(map);
            }
        }
        start = open + 1;
    }
    None
}

/// Index of the `}` closing the `{` at `open`, skipping braces inside strings.
fn matching_brace(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
