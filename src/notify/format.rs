//! Pure notification rendering.
//!
//! No I/O, clock or locale access happens here: the same snapshot and
//! deltas always render to the same bytes.

use crate::snapshot::{Category, Delta, StockSnapshot};
use std::fmt::Write as _;

/// Discord rejects message content longer than this.
pub const MAX_MESSAGE_CHARS: usize = 2000;

const TITLE: &str = "🌱 **Garden Stock Update**";
const CHANGES_HEADING: &str = "📈 Changes";
const EMPTY_PLACEHOLDER: &str = "_none_";
const FAILURE_TEXT: &str = "❌ Failed to fetch stock/weather data.";

/// Render a snapshot, plus a change summary when `deltas` is non-empty.
pub fn render(snapshot: &StockSnapshot, deltas: Option<&[Delta]>) -> String {
    let mut out = String::new();
    out.push_str(TITLE);
    out.push('\n');

    for &category in Category::all() {
        let _ = write!(out, "\n**{}**\n", category.heading());
        let items = snapshot.items(category);
        if items.is_empty() {
            let _ = writeln!(out, "• {EMPTY_PLACEHOLDER}");
        }
        for item in items {
            let _ = writeln!(out, "• **{}**: {}", item.name, item.quantity);
        }
    }

    let condition = snapshot.weather.condition.as_deref().unwrap_or("Unknown");
    let temperature = snapshot.weather.temperature.as_deref().unwrap_or("N/A");
    let _ = writeln!(out, "\n**🌤️ Weather**: {condition}");
    let _ = writeln!(out, "**🌡️ Temp**: {temperature}°C");

    if let Some(deltas) = deltas.filter(|d| !d.is_empty()) {
        let _ = writeln!(out, "\n**{CHANGES_HEADING}**");
        for delta in deltas {
            let _ = writeln!(out, "• {delta}");
        }
    }

    out
}

/// User-visible reply when an on-demand fetch fails.
pub fn render_failure() -> String {
    FAILURE_TEXT.to_owned()
}

/// Trim `text` to at most `max_chars` characters, cutting at a line break.
///
/// Truncated output ends with `…` on its own line and still fits the limit.
pub fn clamp_to_limit(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }
    let budget = max_chars.saturating_sub(2);
    let mut out = String::new();
    let mut used = 0usize;
    for line in text.split_inclusive('\n') {
        let len = line.chars().count();
        if used + len > budget {
            break;
        }
        out.push_str(line);
        used += len;
    }
    if out.is_empty() {
        out = text.chars().take(budget).collect();
        out.push('\n');
    } else if !out.ends_with('\n') {
        out.push('\n');
    }
    out.push('…');
    out
}
