// src/core/sanitize.rs

/// U+02BC MODIFIER LETTER APOSTROPHE. Removed outright, not replaced.
pub const MODIFIER_APOSTROPHE: char = '\u{02BC}';

/// Escape the three XML metacharacters. `&` goes first so it isn't double-escaped.
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Normalize one stored text field for publishing.
/// An empty cell is a null; null → " " → trimmed to "".
pub fn normalize_text(raw: &str) -> String {
    let value = if raw.is_empty() { " " } else { raw };
    escape_xml(value.trim())
        .chars()
        .filter(|&c| c != MODIFIER_APOSTROPHE)
        .collect()
}

/// Everything from the first `?` onward is dropped.
pub fn strip_query(url: &str) -> &str {
    match url.split_once('?') {
        Some((head, _)) => head,
        None => url,
    }
}
