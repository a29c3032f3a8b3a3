//! URL-encoded key/value decoding.

use farmgate_core::DispatchError;
use indexmap::IndexMap;

/// Decodes `application/x-www-form-urlencoded` data into an ordered map.
///
/// Repeated keys keep their first position and their last value.
pub fn parse_urlencoded(input: &str) -> Result<IndexMap<String, String>, DispatchError> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(input)
        .map_err(|e| DispatchError::malformed(format!("invalid form data: {e}")))?;
    Ok(pairs.into_iter().collect())
}

/// Decodes a query string (without the leading `?`).
///
/// Query strings are best-effort: undecodable input yields an empty map.
#[must_use]
pub fn parse_query(query: &str) -> IndexMap<String, String> {
    match parse_urlencoded(query) {
        Ok(map) => map,
        Err(e) => {
            tracing::debug!(error = %e, "ignoring undecodable query string");
            IndexMap::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_urlencoded_keeps_order() {
        let map = parse_urlencoded("b=2&a=hello+world&c=%2Fx").unwrap();
        let keys: Vec<_> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(map["a"], "hello world");
        assert_eq!(map["c"], "/x");
    }

    #[test]
    fn test_parse_query_empty() {
        assert!(parse_query("").is_empty());
        assert_eq!(parse_query("page=2")["page"], "2");
    }
}
