//! Tracing utilities for plait query observability.
//!
//! Enable the `tracing` feature to emit events via the `tracing` crate.
//! These macros no-op when the feature is disabled, avoiding `#[cfg]` boilerplate
//! at every call site.

/// Emit a debug-level tracing event with the SQL text and parameter count.
///
/// ```ignore
/// plait_trace_query!(&statement.sql, statement.params.len());
/// ```
#[macro_export]
macro_rules! plait_trace_query {
    ($sql:expr, $param_count:expr) => {
        #[cfg(feature = "tracing")]
        tracing::debug!(sql = %$sql, params = $param_count, "plait.query");
    };
}

/// Emit a debug-level tracing event describing a freshly built plan.
///
/// ```ignore
/// plait_trace_plan!(plan.root.name(), plan.shape, plan.units());
/// ```
#[macro_export]
macro_rules! plait_trace_plan {
    ($root:expr, $shape:expr, $units:expr) => {
        #[cfg(feature = "tracing")]
        tracing::debug!(root = %$root, shape = ?$shape, units = $units, "plait.plan");
    };
}

/// Emit a debug-level tracing event for registry changes.
#[macro_export]
macro_rules! plait_trace_schema {
    ($event:literal, $name:expr) => {
        #[cfg(feature = "tracing")]
        tracing::debug!(event = $event, name = %$name, "plait.schema");
    };
}
