//! On-disk provider layouts for pass and runner tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use assetsync_client::RemoteItem;
use assetsync_reconcile::{derive_key, format_tag, CompositeKey, LocalRecord};

pub const ACME_CONFIG: &str = r#"{
    "columnMapping": {
        "Asset No": "assetNumber",
        "Client": "clientNumber",
        "Description": "assetDescription",
        "Value": "value"
    },
    "compositeKeyColumns": ["assetNumber", "clientNumber"],
    "csvAssetDescriptionColumn": "assetDescription"
}"#;

pub const ACME_HEADER: &str = "Asset No;Client;Description;Value";

/// A config dir and a data dir side by side.
pub struct Workspace {
    pub root: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("config")).unwrap();
        fs::create_dir_all(root.path().join("data")).unwrap();
        Self { root }
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root.path().join("config")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.path().join("data")
    }

    pub fn add_provider(&self, name: &str, config: Option<&str>) {
        let dir = self.config_dir().join(name);
        fs::create_dir_all(&dir).unwrap();
        if let Some(config) = config {
            fs::write(dir.join("config.json"), config).unwrap();
        }
    }

    pub fn add_file(&self, provider: &str, file: &str, content: &str) -> PathBuf {
        let dir = self.data_dir().join(provider);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(file);
        fs::write(&path, content).unwrap();
        path
    }

    pub fn processed_files(&self, provider: &str) -> Vec<PathBuf> {
        let dir = self.data_dir().join(provider).join("processed");
        if !dir.exists() {
            return Vec::new();
        }
        let mut files: Vec<PathBuf> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        files.sort();
        files
    }
}

/// Key of an acme record, as the engine derives it.
pub fn acme_key(asset_number: &str, client: &str) -> CompositeKey {
    let record: LocalRecord = [
        ("assetNumber", Some(asset_number.to_string())),
        ("clientNumber", Some(client.to_string())),
    ]
    .into_iter()
    .collect();
    derive_key(
        &record,
        &["assetNumber".to_string(), "clientNumber".to_string()],
    )
}

pub fn tagged_item(id: &str, key: &CompositeKey) -> RemoteItem {
    RemoteItem::new(id)
        .with_name("Imported asset")
        .with_description(format_tag(key))
}

pub fn name_tagged_item(id: &str, key: &CompositeKey) -> RemoteItem {
    RemoteItem::new(id).with_name(format!("Imported asset {}", format_tag(key)))
}

pub fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}
