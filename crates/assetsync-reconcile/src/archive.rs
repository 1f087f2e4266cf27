//! Moves processed record files out of the data directory.

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::info;

/// Name of the archive directory next to the record files.
pub const PROCESSED_DIR: &str = "processed";

const STAMP_FORMAT: &str = "%Y-%m-%d-%H:%M:%S";

/// `<dir>/processed/<stem>_<stamp>.csv` for `file` processed at `at`.
#[must_use]
pub fn archive_path(file: &Path, at: DateTime<Local>) -> PathBuf {
    let dir = file.parent().unwrap_or_else(|| Path::new("."));
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    dir.join(PROCESSED_DIR)
        .join(format!("{stem}_{}.csv", at.format(STAMP_FORMAT)))
}

/// Archives files after their pass, or only logs the move when disabled.
#[derive(Debug, Clone, Copy)]
pub struct Archiver {
    enabled: bool,
}

impl Archiver {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Move `file` to its archive path. Returns the destination if moved.
    pub async fn archive(&self, file: &Path, at: DateTime<Local>) -> std::io::Result<Option<PathBuf>> {
        let destination = archive_path(file, at);
        if !self.enabled {
            info!(
                file = %file.display(),
                destination = %destination.display(),
                "Archiving disabled, file left in place"
            );
            return Ok(None);
        }

        if let Some(dir) = destination.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::rename(file, &destination).await?;
        info!(
            file = %file.display(),
            destination = %destination.display(),
            "Record file archived"
        );
        Ok(Some(destination))
    }
}
