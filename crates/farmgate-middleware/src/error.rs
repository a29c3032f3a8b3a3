//! Middleware configuration errors.

use thiserror::Error;

/// Errors raised while parsing or resolving middleware names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MiddlewareError {
    /// Middleware name is empty.
    #[error("middleware name is empty")]
    Empty,

    /// Parametrized middleware without an argument, e.g. `permission:`.
    #[error("middleware '{name}' requires an argument")]
    MissingArgument {
        /// Middleware kind.
        name: String,
    },

    /// Argument contains characters outside `[A-Za-z0-9_.*:-]`.
    #[error("invalid argument '{argument}' for middleware '{name}'")]
    InvalidArgument {
        /// Middleware kind.
        name: String,
        /// Offending argument.
        argument: String,
    },

    /// No middleware is registered under this name.
    #[error("unknown middleware '{0}'")]
    Unknown(String),
}
