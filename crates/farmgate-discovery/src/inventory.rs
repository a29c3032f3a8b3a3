//! Route listings for documentation and audits.

use crate::definition::RouteDefinition;
use serde::Serialize;
use std::fmt;

/// Every discovered route plus the registered controllers that declare none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteInventory {
    /// Routes in registration order.
    pub routes: Vec<RouteDefinition>,
    /// Registered controllers with zero actions.
    pub controllers_without_routes: Vec<String>,
}

impl RouteInventory {
    /// Returns the routes bound to `controller`.
    pub fn routes_for<'a>(
        &'a self,
        controller: &'a str,
    ) -> impl Iterator<Item = &'a RouteDefinition> + 'a {
        self.routes
            .iter()
            .filter(move |route| route.handler.controller == controller)
    }
}

/// One line per route, then the controllers without routes.
impl fmt::Display for RouteInventory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for route in &self.routes {
            write!(
                f,
                "{} {} -> {}::{}",
                route.method, route.path, route.handler.controller, route.handler.action
            )?;
            if !route.middleware.is_empty() {
                write!(f, " [{}]", route.middleware.join(", "))?;
            }
            writeln!(
                f,
                " {}",
                route.description.as_deref().unwrap_or("No description")
            )?;
        }
        writeln!(
            f,
            "controllers without routes: {}",
            self.controllers_without_routes.len()
        )?;
        for id in &self.controllers_without_routes {
            writeln!(f, "  {id}")?;
        }
        Ok(())
    }
}
