//! Text helpers shared by the renderers.

/// Escapes the characters that are significant in HTML text and attribute
/// values.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Builds a stable fragment identifier: ASCII alphanumerics are kept
/// (lowercased), every other run of characters becomes a single `-`.
///
/// ```
/// use xcreport_core::anchor_id;
///
/// assert_eq!(anchor_id("Run Unit Tests / iPhone 15"), "run-unit-tests-iphone-15");
/// ```
pub fn anchor_id(text: &str) -> String {
    let mut id = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            id.push(c.to_ascii_lowercase());
        } else if !id.is_empty() && !id.ends_with('-') {
            id.push('-');
        }
    }
    while id.ends_with('-') {
        id.pop();
    }
    if id.is_empty() {
        id.push_str("section");
    }
    id
}

/// Truncates to at most `max_chars` characters including a trailing `...`.
///
/// UTF-8 safe: slicing happens on character boundaries only.
pub fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let byte_idx = s
        .char_indices()
        .nth(keep)
        .map(|(idx, _)| idx)
        .unwrap_or(s.len());
    format!("{}...", &s[..byte_idx])
}

/// Seconds formatted with two decimals and an `s` suffix.
pub fn format_seconds(seconds: f64) -> String {
    format!("{:.2}s", if seconds.is_finite() { seconds } else { 0.0 })
}
