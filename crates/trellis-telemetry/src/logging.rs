//! Structured logging to stderr.
//!
//! Stdout belongs to command output (`trellis dump` writes documents there),
//! so every layer here writes to stderr.

use crate::{LogFormat, TelemetryConfig, TelemetryError};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the logging subsystem.
///
/// Sets up tracing-subscriber with either JSON or pretty format,
/// respecting the configured log level.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Json => init_json_logging(filter),
        LogFormat::Pretty => init_pretty_logging(filter),
    }
}

fn init_json_logging(filter: EnvFilter) -> Result<(), TelemetryError> {
    let json_layer = fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_current_span(true)
        .with_span_list(false)
        .with_file(false)
        .with_line_number(false)
        .flatten_event(true)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(json_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::LoggingInit(e.to_string())
        })
}

fn init_pretty_logging(filter: EnvFilter) -> Result<(), TelemetryError> {
    let pretty_layer = fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(pretty_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::LoggingInit(e.to_string())
        })
}

/// Standard log event names.
pub mod events {
    /// The CLI is starting.
    pub const STARTUP: &str = "startup";

    /// A load began for a root URI.
    pub const LOAD_STARTED: &str = "load_started";

    /// A resource was fetched, decoded and cached.
    pub const RESOURCE_CACHED: &str = "resource_cached";

    /// A load finished with every reference attached.
    pub const LOAD_COMPLETED: &str = "load_completed";

    /// A load aborted.
    pub const LOAD_FAILED: &str = "load_failed";

    /// Structural or graph validation rejected a document.
    pub const VALIDATION_FAILURE: &str = "validation_failure";
}

/// Helper macros for structured logging with standard fields.
///
/// These wrap the tracing macros to ensure consistent field naming.
#[macro_export]
macro_rules! log_startup {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::STARTUP,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_load_started {
    ($($field:tt)*) => {
        tracing::debug!(
            event = $crate::logging::events::LOAD_STARTED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_resource_cached {
    ($($field:tt)*) => {
        tracing::debug!(
            event = $crate::logging::events::RESOURCE_CACHED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_load_completed {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::LOAD_COMPLETED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_load_failed {
    ($($field:tt)*) => {
        tracing::warn!(
            event = $crate::logging::events::LOAD_FAILED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_validation_failure {
    ($($field:tt)*) => {
        tracing::warn!(
            event = $crate::logging::events::VALIDATION_FAILURE,
            $($field)*
        )
    };
}
