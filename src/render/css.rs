//! Critical / deferred CSS partitioning.
//!
//! The authored stylesheet is split into rule-ish segments by a text
//! scan, then each segment is classified critical (layout-affecting
//! selectors or properties) or budget-bound. Critical segments are kept
//! inline regardless of the byte budget; the rest fill the budget in
//! order and overflow into the deferred bucket, injected client-side on
//! idle.
//!
//! This is a heuristic scanner, not a CSS parser: a `}` inside a nested
//! `@media` block can end a segment early. That only moves rule text
//! between buckets; nothing is dropped (see `minify` for the optional
//! real-parser cleanup of the critical half).

use std::sync::LazyLock;

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use regex::Regex;

// =============================================================================
// Partitioning
// =============================================================================

/// Result of partitioning a stylesheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CssSplit {
    pub critical: String,
    pub deferred: String,
}

/// Selectors that always stay in the critical bucket.
static CRITICAL_SELECTOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(body\b|html\b|\*|@media\b)|\.(hero|banner|header|nav)\b")
        .expect("valid selector pattern")
});

/// Properties that mark a rule as first-paint relevant.
static CRITICAL_PROPERTY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(font[a-z-]*|color|background[a-z-]*|display|position|width|height)\s*:")
        .expect("valid property pattern")
});

/// Partition `css` into critical and deferred halves under `limit` bytes.
///
/// - Empty input yields two empty strings.
/// - Input at or under the limit is entirely critical.
/// - Otherwise segments classified critical are always kept (and count
///   against the budget); remaining segments fill what is left of the
///   budget in order, overflow goes to `deferred`.
///
/// Concatenating both halves preserves every rule exactly once, in its
/// bucket-relative source order.
pub fn split_css(css: &str, limit: usize) -> CssSplit {
    if css.is_empty() {
        return CssSplit::default();
    }
    if css.len() <= limit {
        return CssSplit {
            critical: css.to_owned(),
            deferred: String::new(),
        };
    }

    let mut critical = String::new();
    let mut deferred = String::new();
    let mut budget_used = 0usize;

    for segment in split_segments(css) {
        if is_critical_segment(segment) {
            // Critical segments bypass the limit but still count
            // against it, so budget-bound rules after a large critical
            // one spill to deferred.
            critical.push_str(segment);
            budget_used += segment.len();
        } else if budget_used + segment.len() <= limit {
            critical.push_str(segment);
            budget_used += segment.len();
        } else {
            deferred.push_str(segment);
        }
    }

    CssSplit { critical, deferred }
}

/// Split on every `}` immediately followed by a selector-starting
/// character. The `}` stays with the preceding segment.
fn split_segments(css: &str) -> Vec<&str> {
    let bytes = css.as_bytes();
    let mut segments = Vec::new();
    let mut start = 0;

    for (pos, &byte) in bytes.iter().enumerate() {
        if byte == b'}'
            && matches!(bytes.get(pos + 1), Some(b'.' | b'#' | b'@'))
        {
            segments.push(&css[start..=pos]);
            start = pos + 1;
        }
    }
    if start < css.len() {
        segments.push(&css[start..]);
    }
    segments
}

fn is_critical_segment(segment: &str) -> bool {
    CRITICAL_SELECTOR.is_match(segment) || CRITICAL_PROPERTY.is_match(segment)
}

/// Minify a CSS string with a real parser; returns `None` when the input
/// fails to parse (caller keeps the original).
pub fn minify_css(source: &str) -> Option<String> {
    let stylesheet = StyleSheet::parse(source, ParserOptions::default()).ok()?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .ok()?;
    Some(result.code)
}

// =============================================================================
// Carousel first-paint CSS
// =============================================================================

/// Fixed CSS emitted alongside the critical bucket whenever the page has
/// at least one carousel: lays the first slide out as a visible flex
/// item before the carousel runtime has measured anything.
pub fn carousel_critical_css() -> &'static str {
    "\
.gjs-swiper-root { min-height: 300px; }\n\
.swiper { overflow: hidden; position: relative; }\n\
.swiper-wrapper { display: flex; transition-property: transform; }\n\
.swiper-slide { flex-shrink: 0; width: 100%; position: relative; }\n\
.swiper-slide:first-child { display: block; }\n\
.swiper-slide img { width: 100%; height: 100%; object-fit: cover; display: block; }\n"
}

// =============================================================================
// Tests
// =============================================================================
