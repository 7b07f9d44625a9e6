//! Observability setup for Al-Bayan: structured logging and optional
//! OpenTelemetry export, plus GenAI semantic-convention attribute names.

pub mod genai_attrs;
pub mod tracing_setup;
