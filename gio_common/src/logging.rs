//! `tracing` subscriber setup.
//!
//! The library crates only emit events through `tracing` macros; hosts and
//! binaries call [`init_tracing`] once at startup. `RUST_LOG` overrides the
//! configured level when set.

use crate::config::LogLevel;
use tracing_subscriber::{EnvFilter, fmt};

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

fn env_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_directive()))
}

/// Install the global subscriber.
///
/// Calling it more than once is harmless: later calls leave the first
/// subscriber in place.
pub fn init_tracing(level: LogLevel, format: LogFormat) {
    let builder = fmt::Subscriber::builder()
        .with_env_filter(env_filter(level))
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true);

    let result = match format {
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish()),
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
    };

    if result.is_err() {
        tracing::debug!("global tracing subscriber already installed");
    }
}
