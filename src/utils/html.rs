//! HTML utility functions.
//!
//! Provides common HTML processing functions:
//! - `escape()`, `escape_attr()` - HTML entity escaping
//! - `unescape()` - entity decoding for parsed source text
//! - `is_void_element()` - Self-closing elements (br, img, etc.)
//! - `is_raw_text_element()` - Raw text elements (script, style)

use std::borrow::Cow;

// =============================================================================
// HTML Escaping
// =============================================================================

/// Characters that require HTML escaping.
const ESCAPE_CHARS: [char; 5] = ['<', '>', '&', '"', '\''];

/// Get the HTML entity for a special character.
#[inline]
fn escape_char(c: char) -> Option<&'static str> {
    match c {
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '&' => Some("&amp;"),
        '"' => Some("&quot;"),
        '\'' => Some("&#39;"),
        _ => None,
    }
}

/// Escape HTML special characters in text content.
///
/// Uses `Cow` to avoid allocation when no escaping is needed.
///
/// # Example
/// ```ignore
/// assert_eq!(escape("<script>"), "&lt;script&gt;");
/// assert_eq!(escape("hello"), "hello"); // No allocation
/// ```
#[inline]
pub fn escape(s: &str) -> Cow<'_, str> {
    escape_with(s, &ESCAPE_CHARS)
}

/// Escape HTML attribute values.
///
/// Identical to `escape()` but semantically indicates attribute context.
#[inline]
pub fn escape_attr(s: &str) -> Cow<'_, str> {
    escape_with(s, &ESCAPE_CHARS)
}

/// Internal: escape with specified character set.
#[inline]
fn escape_with<'a>(s: &'a str, chars: &[char]) -> Cow<'a, str> {
    if !s.contains(chars) {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match escape_char(c) {
            Some(entity) => result.push_str(entity),
            None => result.push(c),
        }
    }
    Cow::Owned(result)
}

/// Unescape HTML entities back to characters.
///
/// Handles common named entities and numeric character references.
/// Applied to text and attribute values coming out of the tokenizer so
/// the in-memory tree holds decoded strings; serialization re-escapes.
pub fn unescape(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '&' {
            result.push(c);
            continue;
        }

        // Collect entity
        let mut entity = String::new();
        for c in chars.by_ref() {
            if c == ';' {
                break;
            }
            entity.push(c);
            if entity.len() > 10 {
                // Too long, not a valid entity
                result.push('&');
                result.push_str(&entity);
                entity.clear();
                break;
            }
        }

        if entity.is_empty() {
            result.push('&');
            continue;
        }

        // Decode entity
        match entity.as_str() {
            "lt" => result.push('<'),
            "gt" => result.push('>'),
            "amp" => result.push('&'),
            "quot" => result.push('"'),
            "apos" => result.push('\''),
            "nbsp" => result.push('\u{00A0}'),
            s if s.starts_with('#') => {
                let code = if s.starts_with("#x") || s.starts_with("#X") {
                    u32::from_str_radix(&s[2..], 16).ok()
                } else {
                    s[1..].parse().ok()
                };
                if let Some(c) = code.and_then(char::from_u32) {
                    result.push(c);
                } else {
                    result.push('&');
                    result.push_str(&entity);
                    result.push(';');
                }
            }
            _ => {
                result.push('&');
                result.push_str(&entity);
                result.push(';');
            }
        }
    }

    Cow::Owned(result)
}

// =============================================================================
// Element Classification
// =============================================================================

/// Check if an HTML tag is a void element (self-closing).
///
/// Void elements cannot have children and are rendered without a closing
/// tag.
#[inline]
pub fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Check if tag is a raw text element (content is never HTML-escaped).
///
/// Per HTML spec: script and style content is "raw text".
#[inline]
pub fn is_raw_text_element(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}
