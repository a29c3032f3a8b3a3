//! Metric names and descriptions.
//!
//! Farmgate records through the `metrics` facade and installs no exporter;
//! the host application picks one.
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `farmgate_dispatch_total` | Counter | `status` | Dispatched requests |
//! | `farmgate_route_cache_total` | Counter | `tier`, `outcome` | Route cache lookups |

use metrics::{describe_counter, Unit};

/// Dispatched request counter.
pub const DISPATCH_TOTAL: &str = "farmgate_dispatch_total";

/// Route cache lookup counter.
pub const ROUTE_CACHE_TOTAL: &str = "farmgate_route_cache_total";

/// Registers descriptions for every Farmgate metric with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(DISPATCH_TOTAL, Unit::Count, "Total number of dispatched requests");
    describe_counter!(
        ROUTE_CACHE_TOTAL,
        Unit::Count,
        "Route cache lookups by tier and outcome"
    );
}
