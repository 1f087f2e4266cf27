//! Error types for the reconciliation crate.
//!
//! Each error is handled at the smallest scope that can absorb it: a
//! [`ConfigError`] skips a provider, a [`ParseError`] skips a row or a file,
//! a [`PassError`] ends one file pass. Only a [`DiscoveryError`] stops a run.

use std::path::PathBuf;
use thiserror::Error;

use assetsync_client::FetchError;

/// Provider configuration could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("provider config not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read provider config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid provider config {}: {source}", .path.display())]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("provider config {} has no compositeKeyColumns", .path.display())]
    MissingKeyColumns { path: PathBuf },

    #[error("provider config {}: {message}", .path.display())]
    Invalid { path: PathBuf, message: String },
}

/// A local record file could not be read.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to read header of {}: {source}", .path.display())]
    Header {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{} has no header row", .path.display())]
    MissingHeader { path: PathBuf },
}

/// A single provider/file pass did not complete.
#[derive(Debug, Error)]
pub enum PassError {
    #[error("remote baseline unavailable: {0}")]
    Fetch(#[from] FetchError),

    #[error("local records unavailable: {0}")]
    Parse(#[from] ParseError),
}

/// Provider or data directories could not be listed.
#[derive(Debug, Error)]
#[error("cannot read directory {}: {source}", .path.display())]
pub struct DiscoveryError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl DiscoveryError {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}
