//! Observability infrastructure for Dockyard.
//!
//! Structured logging through `tracing`, with the output format controlled
//! by `DOCKYARD_LOG_FORMAT`:
//! - `json` - one JSON object per event
//! - `pretty` - multi-line human-readable output (default on a TTY)
//! - `compact` - single-line output
//!
//! # Example
//!
//! ```ignore
//! use dockyard_runtime::observability::{TracingConfig, init_tracing};
//!
//! let _guard = init_tracing(TracingConfig::from_env())?;
//! ```

mod config;
mod tracing_setup;

pub use config::{LogFormat, TracingConfig};
pub use tracing_setup::{TracingGuard, init_tracing};

/// Span covering the lifetime of one execution unit.
#[macro_export]
macro_rules! instrument_unit {
    ($slug:expr, $generation:expr) => {
        tracing::info_span!(
            "execution_unit",
            slug = %$slug,
            generation = %$generation,
        )
    };
}

/// Span covering one request served by an execution unit.
#[macro_export]
macro_rules! instrument_invocation {
    ($request_id:expr, $operation:expr) => {
        tracing::debug_span!(
            "invocation",
            request_id = %$request_id,
            operation = $operation,
        )
    };
    ($request_id:expr, $operation:expr, $key:expr) => {
        tracing::debug_span!(
            "invocation",
            request_id = %$request_id,
            operation = $operation,
            key = %$key,
        )
    };
}
