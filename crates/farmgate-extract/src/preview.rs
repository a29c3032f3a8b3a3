//! Log-safe payload previews.

/// Returns a single-line preview of `payload` for logging.
///
/// Control characters (including newlines) become spaces; the result is
/// truncated to `max_chars` characters with `...` appended when cut.
///
/// ```
/// use farmgate_extract::sanitize_preview;
///
/// assert_eq!(sanitize_preview("{\"a\":\n1", 200), "{\"a\": 1");
/// assert_eq!(sanitize_preview("abcdef", 3), "abc...");
/// ```
#[must_use]
pub fn sanitize_preview(payload: &str, max_chars: usize) -> String {
    let mut out: String = payload
        .chars()
        .take(max_chars)
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    if payload.chars().nth(max_chars).is_some() {
        out.push_str("...");
    }
    out
}
