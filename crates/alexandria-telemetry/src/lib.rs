//! # Alexandria Telemetry
//!
//! Structured logging for the Alexandria indexer.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use alexandria_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TelemetryConfig::from_env();
//!     init_logging(&config)?;
//!     tracing::info!("[alx] indexer starting");
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ALX_LOG_LEVEL` | `RUST_LOG`, then `info` | Log level filter |
//! | `ALX_JSON_LOGS` | `true` in containers | JSON formatted logs |
//! | `ALX_CONSOLE_OUTPUT` | `true` | Write logs at all |
//! | `ALX_SERVICE_NAME` | `alexandria-indexer` | Service name in log lines |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::init_logging;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter {filter:?}: {reason}")]
    Filter { filter: String, reason: String },

    #[error("Failed to install log subscriber: {0}")]
    SubscriberInit(String),
}

/// Convenience macro for logging a record-level event with standard fields.
///
/// # Example
///
/// ```rust,ignore
/// use alexandria_telemetry::log_record_event;
///
/// log_record_event!(info, "media stored", txid, block_height);
/// ```
#[macro_export]
macro_rules! log_record_event {
    ($level:ident, $msg:expr, $txid:expr, $block_height:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            txid = %$txid,
            block_height = $block_height,
            $($($field)*,)?
            "[alx] {}", $msg
        )
    };
}
