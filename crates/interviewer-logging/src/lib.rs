//! # interviewer-logging
//!
//! Logging for the interviewer system.
//!
//! ## Key Types
//!
//! - [`Logger`] - Structured interview event logging
//! - [`LogEvent`] - Log event types
//! - [`LogFormat`] - Output formats (Pretty, JSON, Compact)
//! - [`TranscriptWriter`] - Per-interview JSONL transcripts

mod events;
mod transcript;

pub use events::{LogEvent, LogFormat, Logger};
pub use transcript::{TranscriptLine, TranscriptWriter};

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing for the application
pub fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_target(false))
                .init();
        }
        LogFormat::Pretty | LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(false))
                .init();
        }
    }
}

/// Initialize tracing with an additional daily-rolling JSON file in `log_dir`.
///
/// The returned guard must be held for the lifetime of the process so
/// buffered lines are flushed.
pub fn init_tracing_with_file(level: &str, format: LogFormat, log_dir: &Path) -> WorkerGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let appender = tracing_appender::rolling::daily(log_dir, "interviewer.log");
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_target(false))
                .with(
                    fmt::layer()
                        .json()
                        .with_ansi(false)
                        .with_writer(file_writer),
                )
                .init();
        }
        LogFormat::Pretty | LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(false))
                .with(
                    fmt::layer()
                        .json()
                        .with_ansi(false)
                        .with_writer(file_writer),
                )
                .init();
        }
    }

    guard
}
