#![deny(missing_docs)]

//! Installs the process-wide `tracing` subscriber used by programs built on
//! the registry client.

use std::io;
use tracing_subscriber::{fmt, EnvFilter};

pub use tracing_core::Level;

/// possible log levels
pub const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Environment variable that, when set, takes precedence over the level passed to [`init`]
pub const FILTER_ENV: &str = "PLURAL_LOG";

/// Builds the filter for a run: `PLURAL_LOG` wins when present and valid,
/// otherwise everything at `level` and above is kept.
pub fn filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_env(FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()))
}

/// Initializes a global tracing subscriber writing to stderr.
///
/// Passing `None` leaves logging off, which is the default for library
/// consumers that never call this.
pub fn init(level: Option<Level>) {
    if let Some(level) = level {
        let format = fmt::format().without_time().compact();
        let _ = fmt()
            .with_env_filter(filter(level))
            .event_format(format)
            .with_writer(io::stderr)
            .try_init();
    }
}
