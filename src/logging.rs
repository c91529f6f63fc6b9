//! Logging setup
//!
//! Installs the global `tracing` subscriber for the binaries.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{QueueKvError, Result};

/// Install a fmt subscriber filtered by `RUST_LOG` (or `default_filter`)
///
/// With a log file, events are appended to it without ANSI colours;
/// otherwise they go to stderr. Every line carries a timestamp.
pub fn init(log_file: Option<&Path>, default_filter: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let installed = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    QueueKvError::Config(format!("cannot open log file {}: {}", path.display(), e))
                })?;

            fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(std::io::stderr)
            .try_init(),
    };

    installed.map_err(|e| QueueKvError::Config(format!("cannot install logger: {}", e)))
}
