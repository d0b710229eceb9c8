//! Raw upstream payload → canonical [`StockSnapshot`].
//!
//! Upstream shape is not contractually stable. Each category has an explicit
//! optional field; anything missing or unrecognised becomes an empty
//! sequence so nothing loosely typed leaks past this module.

use super::{Category, StockItem, StockSnapshot, WeatherReport};
use crate::error::{Result, StockError};
use chrono::{DateTime, Utc};
use garden_feed::RawPayload;
use serde_json::Value;

/// Literal upstream value meaning "not in stock".
pub const ABSENT_SENTINEL: &str = "0";

/// Returns `true` when a raw value marks an absent entry.
///
/// This is an exact string comparison, not a numeric check: `"00"` or
/// `" 0"` are real quantities as far as the filter is concerned.
pub fn is_absent_sentinel(raw: &str) -> bool {
    raw == ABSENT_SENTINEL
}

/// Normalize one raw observation captured at `observed_at`.
///
/// # Errors
///
/// Returns [`StockError::Normalization`] when the gear/seeds document is not
/// a JSON object. The egg and weather documents are optional.
pub fn normalize(raw: &RawPayload, observed_at: DateTime<Utc>) -> Result<StockSnapshot> {
    let stock = raw.stock.as_object().ok_or_else(|| {
        StockError::Normalization(format!(
            "stock document must be an object, got {}",
            json_kind(&raw.stock)
        ))
    })?;
    let eggs = raw.eggs.as_object();

    let mut snapshot = StockSnapshot::new(observed_at);
    for &category in Category::all() {
        let field = match category {
            Category::Gear => stock.get("gear"),
            Category::Seeds => stock.get("seeds"),
            Category::Eggs => eggs.and_then(|doc| doc.get("egg")),
        };
        let items = field.map(normalize_category).unwrap_or_default();
        snapshot.set_items(category, items);
    }
    snapshot.weather = normalize_weather(&raw.weather);
    Ok(snapshot)
}

/// Normalize a single category value.
///
/// Accepts an object of `name → quantity` or an array of `"Name xN"`
/// listing strings. Sentinel and unparseable entries are dropped.
pub fn normalize_category(value: &Value) -> Vec<StockItem> {
    let mut items = Vec::new();
    match value {
        Value::Object(map) => {
            for (name, raw) in map {
                let Some(text) = raw_text(raw) else {
                    tracing::debug!(item = %name, "skipping non-scalar quantity");
                    continue;
                };
                push_entry(&mut items, name, &text);
            }
        }
        Value::Array(entries) => {
            for entry in entries {
                let Some((name, text)) = entry.as_str().and_then(split_listing) else {
                    tracing::debug!(entry = %entry, "skipping unrecognised listing");
                    continue;
                };
                push_entry(&mut items, &name, &text);
            }
        }
        Value::Null => {}
        other => {
            tracing::debug!(kind = json_kind(other), "unrecognised category shape");
        }
    }
    items
}

fn push_entry(items: &mut Vec<StockItem>, name: &str, text: &str) {
    if is_absent_sentinel(text) {
        return;
    }
    match coerce_quantity(text) {
        Some(quantity) => items.push(StockItem::new(name.trim(), quantity)),
        None => tracing::debug!(item = %name, value = %text, "unparseable quantity"),
    }
}

/// String form of a scalar JSON value, as compared against the sentinel.
fn raw_text(raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn coerce_quantity(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix(['x', 'X'])
        .unwrap_or(trimmed)
        .trim();
    digits.parse::<i64>().ok()
}

/// Split `"Carrot **x5**"` into `("Carrot", "5")`.
fn split_listing(line: &str) -> Option<(String, String)> {
    let cleaned = line.replace("**", "");
    let (name, token) = cleaned.trim().rsplit_once(char::is_whitespace)?;
    let count = token.strip_prefix(['x', 'X'])?;
    if name.trim().is_empty() || count.is_empty() {
        return None;
    }
    Some((name.trim().to_owned(), count.to_owned()))
}

fn normalize_weather(doc: &Value) -> WeatherReport {
    let text = |key: &str| {
        doc.get(key)
            .and_then(raw_text)
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
    };
    WeatherReport {
        condition: text("weather"),
        temperature: text("temp"),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
