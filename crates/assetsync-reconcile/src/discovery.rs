//! Provider and record file discovery.
//!
//! Every subdirectory of the config directory is a provider. Its config is
//! `<config_dir>/<name>/config.json` and its record files are
//! `<data_dir>/<name>/*.csv`.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{ConfigError, DiscoveryError};
use crate::provider::ProviderConfig;

/// File name of a provider's configuration.
pub const CONFIG_FILE: &str = "config.json";

/// A provider found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provider {
    pub name: String,
    pub config_path: PathBuf,
    pub data_dir: PathBuf,
}

impl Provider {
    #[must_use]
    pub fn new(name: impl Into<String>, config_dir: &Path, data_dir: &Path) -> Self {
        let name = name.into();
        Self {
            config_path: config_dir.join(&name).join(CONFIG_FILE),
            data_dir: data_dir.join(&name),
            name,
        }
    }

    pub fn load_config(&self) -> Result<ProviderConfig, ConfigError> {
        ProviderConfig::load(&self.config_path)
    }

    /// CSV files of this provider, sorted by name.
    ///
    /// A missing data directory means there is nothing to process.
    pub fn data_files(&self) -> Result<Vec<PathBuf>, DiscoveryError> {
        if !self.data_dir.is_dir() {
            debug!(provider = %self.name, dir = %self.data_dir.display(), "No data directory");
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in read_dir(&self.data_dir)? {
            let entry = entry.map_err(|e| DiscoveryError::new(&self.data_dir, e))?;
            let path = entry.path();
            let is_csv = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if is_csv && path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

/// Providers under `config_dir`, sorted by name.
pub fn discover_providers(
    config_dir: &Path,
    data_dir: &Path,
) -> Result<Vec<Provider>, DiscoveryError> {
    let mut names = Vec::new();
    for entry in read_dir(config_dir)? {
        let entry = entry.map_err(|e| DiscoveryError::new(config_dir, e))?;
        if !entry.path().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        names.push(name);
    }
    names.sort();

    Ok(names
        .into_iter()
        .map(|name| Provider::new(name, config_dir, data_dir))
        .collect())
}

fn read_dir(dir: &Path) -> Result<std::fs::ReadDir, DiscoveryError> {
    std::fs::read_dir(dir).map_err(|e| DiscoveryError::new(dir, e))
}
