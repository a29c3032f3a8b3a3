//! Serializable route definitions produced by discovery.

use crate::controller::{ActionInput, ActionMeta, RouteGroup};
use farmgate_core::HttpMethod;
use serde::{Deserialize, Serialize};

/// Controller and action a route is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandlerRef {
    /// Controller identifier.
    pub controller: String,
    /// Action name.
    pub action: String,
}

/// One discovered route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDefinition {
    /// HTTP method.
    pub method: HttpMethod,
    /// Full path template (group prefix included).
    pub path: String,
    /// Bound handler.
    pub handler: HandlerRef,
    /// Group then action middleware tags.
    #[serde(default)]
    pub middleware: Vec<String>,
    /// Whether authentication middleware is skipped.
    #[serde(default)]
    pub is_public: bool,
    /// Payload style.
    #[serde(default)]
    pub input: ActionInput,
    /// Listing description, if the action declared one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RouteDefinition {
    pub(crate) fn from_action(controller: &str, group: &RouteGroup, action: &ActionMeta) -> Self {
        Self {
            method: action.method,
            path: join_paths(&group.prefix, &action.path),
            handler: HandlerRef {
                controller: controller.to_string(),
                action: action.name.clone(),
            },
            middleware: group
                .middleware
                .iter()
                .chain(&action.middleware)
                .cloned()
                .collect(),
            is_public: action.is_public,
            input: action.input,
            description: action.description.clone(),
        }
    }
}

/// Joins a group prefix and an action path into one `/`-rooted template.
pub(crate) fn join_paths(prefix: &str, path: &str) -> String {
    let joined = [prefix, path]
        .iter()
        .map(|part| part.trim_matches('/'))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    format!("/{joined}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_paths() {
        assert_eq!(join_paths("/users", "/{id}"), "/users/{id}");
        assert_eq!(join_paths("/users/", "/"), "/users");
        assert_eq!(join_paths("", "health"), "/health");
        assert_eq!(join_paths("", ""), "/");
    }

    #[test]
    fn test_from_action_merges_group() {
        let group = RouteGroup::new("/admin").middleware(["auth"]);
        let action = ActionMeta::put("update", "/users/{id}").middleware(["permission:users:write"]);

        let def = RouteDefinition::from_action("app::admin_controller", &group, &action);
        assert_eq!(def.path, "/admin/users/{id}");
        assert_eq!(def.middleware, vec!["auth", "permission:users:write"]);
        assert_eq!(def.handler.action, "update");
        assert_eq!(def.method, HttpMethod::Put);
    }

    #[test]
    fn test_definition_json_layout() {
        let def = RouteDefinition::from_action(
            "c",
            &RouteGroup::default(),
            &ActionMeta::get("ping", "/ping").public(),
        );
        let value = serde_json::to_value(&def).unwrap();
        assert_eq!(value["method"], "GET");
        assert_eq!(value["handler"]["controller"], "c");
        assert_eq!(value["is_public"], true);
        assert_eq!(value["input"], "request");
        assert!(value.get("description").is_none());
    }

    #[test]
    fn test_description_survives_snapshot() {
        let def = RouteDefinition::from_action(
            "c",
            &RouteGroup::new("/fields"),
            &ActionMeta::get("index", "/").describe("List fields"),
        );
        let json = serde_json::to_string(&def).unwrap();
        assert!(json.contains("\"description\":\"List fields\""));
        let back: RouteDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(back.description.as_deref(), Some("List fields"));
    }
}
