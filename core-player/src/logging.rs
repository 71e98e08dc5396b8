//! # Logging Setup
//!
//! Configures the `tracing-subscriber` infrastructure for hosts that do not
//! install their own subscriber. Filtering honors `RUST_LOG`; the default
//! level is `info`.
//!
//! ## Usage
//!
//! ```ignore
//! use core_player::logging::{init_logging, LogFormat};
//!
//! init_logging(LogFormat::Compact)?;
//! tracing::info!("player starting");
//! ```

use tracing_subscriber::EnvFilter;

use crate::error::{PlayerError, Result};

/// Output format for the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Multi-line human-readable output.
    Pretty,
    /// Single-line output suitable for piping.
    #[default]
    Compact,
}

/// Install a global `tracing` subscriber.
///
/// # Errors
///
/// [`PlayerError::Internal`] when a subscriber is already installed.
pub fn init_logging(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = match format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };

    result.map_err(|e| PlayerError::Internal(format!("failed to install subscriber: {e}")))
}
