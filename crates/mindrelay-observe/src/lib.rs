//! Observability setup for mindrelay: tracing subscriber initialisation and
//! optional OpenTelemetry span export.

pub mod tracing_setup;
