//! Logging for trellis tools.
//!
//! # Usage
//!
//! ```ignore
//! use trellis_telemetry::{LogFormat, TelemetryConfig};
//!
//! let config = TelemetryConfig::new()
//!     .with_log_level("debug")
//!     .with_log_format(LogFormat::Json);
//!
//! trellis_telemetry::init(&config)?;
//! ```

pub mod config;
pub mod logging;

pub use config::{LogFormat, TelemetryConfig};
pub use logging::events;

use thiserror::Error;

/// Telemetry errors.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to initialize logging.
    #[error("E1401: failed to initialize logging: {0}")]
    LoggingInit(String),
}

/// Install the global subscriber and record the startup event.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    logging::init_logging(config)?;
    crate::log_startup!(
        service = %config.service_name,
        version = env!("CARGO_PKG_VERSION"),
        "logging initialized"
    );
    Ok(())
}
