//! Observability setup for Farmgate.
//!
//! - **Logging**: `tracing-subscriber` with an `EnvFilter`, JSON or pretty output
//! - **Metrics**: counter names and descriptions for the `metrics` facade
//!
//! Every Farmgate crate logs through `tracing` macros with the structured
//! field names in [`logging::fields`].

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig, LogFormat};
pub use metrics::describe_metrics;

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
