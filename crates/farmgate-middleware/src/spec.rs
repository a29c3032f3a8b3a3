//! Parsed middleware identifiers.
//!
//! Routes name their middleware with string tags. Plain names (`auth`,
//! `throttle`) refer to registered middleware; a few prefixes carry an
//! argument and are turned into built-in guards:
//!
//! | Tag | Spec |
//! |---|---|
//! | `permission:users:read` | [`MiddlewareSpec::Permission`] |
//! | `permissionAny:users:read,users:write` | [`MiddlewareSpec::PermissionAny`] |
//! | `permissionAll:users:read,users:write` | [`MiddlewareSpec::PermissionAll`] |
//!
//! `permission_any` and `permission_all` are accepted as aliases.
//! | `scope:orders.read` | [`MiddlewareSpec::Scope`] |

use crate::error::MiddlewareError;
use std::fmt;
use std::str::FromStr;

/// A parsed middleware tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MiddlewareSpec {
    /// Registered middleware by name.
    Named(String),
    /// Requires one permission.
    Permission(String),
    /// Requires at least one of the permissions.
    PermissionAny(Vec<String>),
    /// Requires every permission.
    PermissionAll(Vec<String>),
    /// Requires a scope.
    Scope(String),
}

const PERMISSION: &str = "permission";
const PERMISSION_ANY: &str = "permissionAny";
const PERMISSION_ALL: &str = "permissionAll";
const PERMISSION_ANY_ALIAS: &str = "permission_any";
const PERMISSION_ALL_ALIAS: &str = "permission_all";
const SCOPE: &str = "scope";

impl MiddlewareSpec {
    /// Parses a middleware tag.
    ///
    /// The tag is split at the first `:`. Unrecognized prefixes are kept
    /// whole as a [`Named`](Self::Named) spec.
    pub fn parse(tag: &str) -> Result<Self, MiddlewareError> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(MiddlewareError::Empty);
        }

        let Some((kind, argument)) = tag.split_once(':') else {
            return Ok(Self::Named(tag.to_string()));
        };

        match kind {
            PERMISSION => single(kind, argument).map(Self::Permission),
            PERMISSION_ANY | PERMISSION_ANY_ALIAS => list(kind, argument).map(Self::PermissionAny),
            PERMISSION_ALL | PERMISSION_ALL_ALIAS => list(kind, argument).map(Self::PermissionAll),
            SCOPE => single(kind, argument).map(Self::Scope),
            _ => Ok(Self::Named(tag.to_string())),
        }
    }

    /// Returns `true` for specs resolved to built-in guards.
    #[must_use]
    pub fn is_guard(&self) -> bool {
        !matches!(self, Self::Named(_))
    }
}

impl FromStr for MiddlewareSpec {
    type Err = MiddlewareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MiddlewareSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Permission(p) => write!(f, "{PERMISSION}:{p}"),
            Self::PermissionAny(ps) => write!(f, "{PERMISSION_ANY}:{}", ps.join(",")),
            Self::PermissionAll(ps) => write!(f, "{PERMISSION_ALL}:{}", ps.join(",")),
            Self::Scope(s) => write!(f, "{SCOPE}:{s}"),
        }
    }
}

fn single(kind: &str, argument: &str) -> Result<String, MiddlewareError> {
    let argument = argument.trim();
    if argument.is_empty() {
        return Err(MiddlewareError::MissingArgument {
            name: kind.to_string(),
        });
    }
    if !argument.chars().all(is_argument_char) {
        return Err(MiddlewareError::InvalidArgument {
            name: kind.to_string(),
            argument: argument.to_string(),
        });
    }
    Ok(argument.to_string())
}

fn list(kind: &str, argument: &str) -> Result<Vec<String>, MiddlewareError> {
    if argument.trim().is_empty() {
        return Err(MiddlewareError::MissingArgument {
            name: kind.to_string(),
        });
    }
    argument.split(',').map(|item| single(kind, item)).collect()
}

fn is_argument_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '*' | ':' | '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_named() {
        assert_eq!(
            MiddlewareSpec::parse("auth").unwrap(),
            MiddlewareSpec::Named("auth".into())
        );
        // unknown prefixes stay whole
        assert_eq!(
            MiddlewareSpec::parse("throttle:60").unwrap(),
            MiddlewareSpec::Named("throttle:60".into())
        );
    }

    #[test]
    fn test_parse_permission_keeps_nested_colons() {
        assert_eq!(
            MiddlewareSpec::parse("permission:users:read").unwrap(),
            MiddlewareSpec::Permission("users:read".into())
        );
    }

    #[test]
    fn test_parse_lists() {
        assert_eq!(
            MiddlewareSpec::parse("permissionAny:a,b").unwrap(),
            MiddlewareSpec::PermissionAny(vec!["a".into(), "b".into()])
        );
        assert_eq!(
            MiddlewareSpec::parse("permissionAll:a,b").unwrap(),
            MiddlewareSpec::PermissionAll(vec!["a".into(), "b".into()])
        );
    }

    #[test]
    fn test_parse_snake_case_aliases() {
        assert_eq!(
            MiddlewareSpec::parse("permission_any:users:read, users:write").unwrap(),
            MiddlewareSpec::PermissionAny(vec!["users:read".into(), "users:write".into()])
        );
        assert_eq!(
            MiddlewareSpec::parse("permission_all:a,b").unwrap(),
            MiddlewareSpec::PermissionAll(vec!["a".into(), "b".into()])
        );
    }

    #[test]
    fn test_parse_scope() {
        assert_eq!(
            MiddlewareSpec::parse("scope:orders.read").unwrap(),
            MiddlewareSpec::Scope("orders.read".into())
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(MiddlewareSpec::parse("  "), Err(MiddlewareError::Empty));
        assert_eq!(
            MiddlewareSpec::parse("permission:"),
            Err(MiddlewareError::MissingArgument {
                name: "permission".into()
            })
        );
        assert!(matches!(
            MiddlewareSpec::parse("permission:users read"),
            Err(MiddlewareError::InvalidArgument { .. })
        ));
        assert!(matches!(
            MiddlewareSpec::parse("permission_any:a,,b"),
            Err(MiddlewareError::MissingArgument { .. })
        ));
    }

    #[test]
    fn test_display_round_trips() {
        for tag in [
            "auth",
            "permission:users:read",
            "permissionAny:a,b",
            "permissionAll:x:y,z",
            "scope:orders.read",
        ] {
            assert_eq!(MiddlewareSpec::parse(tag).unwrap().to_string(), tag);
        }
    }
}
