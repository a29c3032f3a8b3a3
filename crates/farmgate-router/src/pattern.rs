//! Path template compilation.
//!
//! A template such as `/users/{id}/posts/{post}` compiles to an anchored
//! regular expression in which each placeholder is a named group matching
//! one path segment (`[^/]+`) and all literal text is escaped.

use crate::error::RouteError;
use indexmap::IndexMap;
use regex::Regex;

/// A compiled path template.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    template: String,
    regex: Regex,
    params: Vec<String>,
}

impl RoutePattern {
    /// Compiles a template.
    ///
    /// The template is normalized first: a leading `/` is added and a
    /// trailing `/` removed (except for the root path).
    ///
    /// ```
    /// use farmgate_router::RoutePattern;
    ///
    /// let pattern = RoutePattern::compile("/users/{id}").unwrap();
    /// let params = pattern.matches("/users/42").unwrap();
    /// assert_eq!(params["id"], "42");
    /// assert!(pattern.matches("/users/42/posts").is_none());
    /// ```
    pub fn compile(template: &str) -> Result<Self, RouteError> {
        let template = normalize_path(template);
        let mut source = String::with_capacity(template.len() + 16);
        let mut params: Vec<String> = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars();

        source.push('^');
        while let Some(c) = chars.next() {
            match c {
                '{' => {
                    source.push_str(&regex::escape(&literal));
                    literal.clear();

                    let mut name = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }
                    if !closed {
                        return Err(RouteError::pattern(&template, "unclosed '{'"));
                    }
                    if !is_valid_param_name(&name) {
                        return Err(RouteError::pattern(
                            &template,
                            format!("invalid placeholder name '{name}'"),
                        ));
                    }
                    if params.contains(&name) {
                        return Err(RouteError::pattern(
                            &template,
                            format!("duplicate placeholder '{name}'"),
                        ));
                    }

                    source.push_str("(?P<");
                    source.push_str(&name);
                    source.push_str(">[^/]+)");
                    params.push(name);
                }
                '}' => return Err(RouteError::pattern(&template, "unmatched '}'")),
                c => literal.push(c),
            }
        }
        source.push_str(&regex::escape(&literal));
        source.push('$');

        let regex = Regex::new(&source).map_err(|e| RouteError::pattern(&template, e.to_string()))?;

        Ok(Self {
            template,
            regex,
            params,
        })
    }

    /// Returns the normalized template.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Returns the placeholder names in template order.
    #[must_use]
    pub fn param_names(&self) -> &[String] {
        &self.params
    }

    /// Returns the anchored regular expression source.
    #[must_use]
    pub fn as_regex(&self) -> &str {
        self.regex.as_str()
    }

    /// Matches a (version-stripped) path, returning parameters in template order.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<IndexMap<String, String>> {
        let path = trim_trailing_slash(path);
        let captures = self.regex.captures(path)?;
        Some(
            self.params
                .iter()
                .filter_map(|name| {
                    captures
                        .name(name)
                        .map(|m| (name.clone(), m.as_str().to_string()))
                })
                .collect(),
        )
    }
}

/// Adds a leading `/` and removes a trailing one (except for `/` itself).
pub(crate) fn normalize_path(path: &str) -> String {
    let trimmed = trim_trailing_slash(path);
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn trim_trailing_slash(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

fn is_valid_param_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
