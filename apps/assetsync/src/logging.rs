//! Logging setup using tracing.
//!
//! Two sinks: stderr (text or JSON) and an append-only file with local
//! timestamps and no ANSI codes. Both share one filter.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogFormat;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,assetsync=debug";

const FILE_TIMESTAMP_FORMAT: &str = "[%Y-%m-%d %H:%M:%S]";

/// The log file could not be opened.
#[derive(Debug, thiserror::Error)]
#[error("cannot open log file {}: {source}", .path.display())]
pub struct LogSinkError {
    path: std::path::PathBuf,
    #[source]
    source: std::io::Error,
}

/// Open `path` for appending, creating it and its directory if needed.
pub fn open_log_file(path: &Path) -> Result<File, LogSinkError> {
    let sink_error = |source| LogSinkError {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(sink_error)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(sink_error)
}

/// Initialize the global subscriber.
///
/// # Panics
///
/// Panics if the subscriber has already been initialized.
pub fn init_logging(format: LogFormat, log_file: &Path) -> Result<(), LogSinkError> {
    let file = open_log_file(log_file)?;

    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let (text_layer, json_layer) = match format {
        LogFormat::Text => (
            Some(fmt::layer().with_writer(std::io::stderr).with_target(true)),
            None,
        ),
        LogFormat::Json => (
            None,
            Some(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .flatten_event(true),
            ),
        ),
    };

    let file_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_timer(ChronoLocal::new(FILE_TIMESTAMP_FORMAT.to_string()));

    tracing_subscriber::registry()
        .with(text_layer)
        .with(json_layer)
        .with(file_layer)
        .with(filter_layer)
        .init();

    tracing::debug!(log_file = %log_file.display(), "Logging initialized");
    Ok(())
}
