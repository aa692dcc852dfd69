//! Presentation helpers shared by all tabs
//!
//! Every string coming from a daemon or from the user goes through
//! [`escape`] before it is interpolated into markup.

use std::fmt::Write;

use chrono::{DateTime, Utc};

/// Escape text for safe interpolation into HTML text or attribute values.
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Human-readable distance between `ts` and `now` ("just now", "5m ago", "in 2h").
pub fn format_relative_time(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(ts).num_seconds();
    let (secs, future) = if delta < 0 {
        (-delta, true)
    } else {
        (delta, false)
    };

    if secs < 10 {
        return if future { "in a moment" } else { "just now" }.to_string();
    }

    let span = if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3_600 {
        format!("{}m", secs / 60)
    } else if secs < 86_400 {
        format!("{}h", secs / 3_600)
    } else {
        format!("{}d", secs / 86_400)
    };

    if future {
        format!("in {}", span)
    } else {
        format!("{} ago", span)
    }
}

/// Compact duration for a millisecond count ("850ms", "4.2s", "3m 05s", "1h 02m").
///
/// Each unit is chosen after rounding, so 59 999 ms reads "1m 00s".
pub fn format_duration(ms: u64) -> String {
    if ms < 1_000 {
        return format!("{}ms", ms);
    }
    let tenths = scaled_tenths(ms, 1_000);
    if tenths < 600 {
        return format!("{}.{}s", tenths / 10, tenths % 10);
    }
    let secs = ms.saturating_add(500) / 1_000;
    if secs < 3_600 {
        return format!("{}m {:02}s", secs / 60, secs % 60);
    }
    let mins = ms.saturating_add(30_000) / 60_000;
    format!("{}h {:02}m", mins / 60, mins % 60)
}

/// Format a byte count as a human-readable string (B, KB, MB, GB).
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    scaled(bytes, &[(1 << 10, "KB"), (1 << 20, "MB"), (1 << 30, "GB")], 1024, " ")
}

/// Abbreviated count ("950", "12.3k", "4.1M").
pub fn format_count(n: u64) -> String {
    if n < 1_000 {
        return n.to_string();
    }
    scaled(n, &[(1_000, "k"), (1_000_000, "M")], 1_000, "")
}

/// `value / unit` in tenths, rounded half up.
fn scaled_tenths(value: u64, unit: u64) -> u64 {
    let tenths = (u128::from(value) * 10 + u128::from(unit) / 2) / u128::from(unit);
    u64::try_from(tenths).unwrap_or(u64::MAX)
}

/// One decimal in the first unit whose rounded value stays below `step`.
fn scaled(value: u64, units: &[(u64, &str)], step: u64, sep: &str) -> String {
    let mut out = String::new();
    for (i, (unit, name)) in units.iter().enumerate() {
        let tenths = scaled_tenths(value, *unit);
        if tenths < step * 10 || i + 1 == units.len() {
            let _ = write!(out, "{}.{}{}{}", tenths / 10, tenths % 10, sep, name);
            break;
        }
    }
    out
}

/// Placeholder block for a section with nothing to show.
pub fn empty_state(icon: &str, text: &str) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "<div class=\"empty-state\"><span class=\"codicon codicon-{}\"></span><p>{}</p></div>",
        escape(icon),
        escape(text)
    );
    out
}
