//! Per-provider configuration.
//!
//! Each provider directory holds a `config.json`:
//!
//! ```json
//! {
//!   "columnMapping": { "Asset No": "assetNumber", "Client": "clientNumber" },
//!   "compositeKeyColumns": ["assetNumber", "clientNumber"],
//!   "csvAssetDescriptionColumn": "assetDescription"
//! }
//! ```

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::warn;

use crate::error::ConfigError;

fn default_value_column() -> String {
    "value".to_string()
}

/// Field mapping and identity rules of one provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Local column name → API attribute name.
    pub column_mapping: BTreeMap<String, String>,
    /// API attributes forming the composite key, in order.
    #[serde(default)]
    pub composite_key_columns: Vec<String>,
    /// API attribute holding the readable name written on normalization.
    #[serde(default)]
    pub csv_asset_description_column: Option<String>,
    /// API attribute pushed as the item value.
    #[serde(default = "default_value_column")]
    pub value_column: String,
    /// When set, values are pushed as `{amount, currency}`.
    #[serde(default)]
    pub currency_column: Option<String>,
    /// Keep the existing description after the tag instead of replacing it.
    #[serde(default)]
    pub preserve_description: bool,
}

impl ProviderConfig {
    /// Read and validate `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        Self::from_json(path, &text)
    }

    /// Parse and validate config text; `path` is only used in errors.
    pub fn from_json(path: &Path, text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(text).map_err(|source| ConfigError::InvalidJson {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        if self.composite_key_columns.is_empty() {
            return Err(ConfigError::MissingKeyColumns {
                path: path.to_path_buf(),
            });
        }
        if self.column_mapping.is_empty() {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                message: "columnMapping is empty".to_string(),
            });
        }
        if self
            .composite_key_columns
            .iter()
            .any(|column| column.trim().is_empty())
        {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                message: "compositeKeyColumns contains an empty name".to_string(),
            });
        }

        let mapped: BTreeSet<&str> = self.column_mapping.values().map(String::as_str).collect();
        for column in &self.composite_key_columns {
            if !mapped.contains(column.as_str()) {
                warn!(
                    config = %path.display(),
                    attribute = %column,
                    "Key attribute is not produced by columnMapping and will always be empty"
                );
            }
        }
        Ok(())
    }
}
