//! Observability for ConnectVit: subscriber setup and shared span field names.

pub mod fields;
pub mod tracing_setup;
