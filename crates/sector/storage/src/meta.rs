//! The per-path storage descriptor.

use std::{
    fmt, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::{AttachError, AttachResult};

/// Name of the descriptor file inside a storage path.
pub const META_FILE: &str = "sectorstore.json";

/// Weight given to newly attached paths.
pub const DEFAULT_WEIGHT: u64 = 10;

/// Unique identity of a storage path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageId(Uuid);

impl StorageId {
    /// A fresh random id.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for StorageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Contents of `sectorstore.json`.
///
/// Written once when a path is first attached and never rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StorageMeta {
    /// Identity of the path.
    #[serde(rename = "ID")]
    pub id: StorageId,
    /// Relative preference when choosing between paths.
    pub weight: u64,
    /// Sectors may be sealed here.
    pub can_seal: bool,
    /// Sealed sectors may be stored here.
    pub can_store: bool,
}

impl StorageMeta {
    /// New descriptor with a fresh id and the default weight.
    pub fn new(can_seal: bool, can_store: bool) -> Self {
        Self {
            id: StorageId::random(),
            weight: DEFAULT_WEIGHT,
            can_seal,
            can_store,
        }
    }

    /// Location of the descriptor inside `dir`.
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(META_FILE)
    }

    /// Read the descriptor of `dir`.
    pub async fn load(dir: &Path) -> AttachResult<Self> {
        let path = Self::path_in(dir);
        let raw = tokio::fs::read(&path)
            .await
            .map_err(|source| AttachError::ReadMeta {
                path: path.clone(),
                source,
            })?;
        serde_json::from_slice(&raw).map_err(|source| AttachError::DecodeMeta { path, source })
    }

    /// Write the descriptor into `dir`.
    ///
    /// Fails with [`io::ErrorKind::AlreadyExists`] if a descriptor is already
    /// there. The file appears with its full contents or not at all, so a
    /// concurrent reader never sees a partial descriptor.
    pub async fn create(&self, dir: &Path) -> AttachResult<()> {
        let path = Self::path_in(dir);
        let tmp = dir.join(format!(".{META_FILE}.{}.tmp", self.id));
        let encoded = serde_json::to_vec_pretty(self).map_err(AttachError::EncodeMeta)?;

        let written = write_new(&tmp, &encoded).await;
        let linked = match written {
            Ok(()) => tokio::fs::hard_link(&tmp, &path).await,
            Err(e) => Err(e),
        };
        let _ = tokio::fs::remove_file(&tmp).await;

        linked.map_err(|source| AttachError::WriteMeta { path, source })
    }
}

async fn write_new(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o644);

    let mut file = options.open(path).await?;
    file.write_all(contents).await?;
    file.sync_all().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_json_layout() {
        let meta = StorageMeta::new(true, false);
        let value: serde_json::Value = serde_json::to_value(&meta).unwrap();

        assert_eq!(value["ID"], serde_json::json!(meta.id.to_string()));
        assert_eq!(value["Weight"], 10);
        assert_eq!(value["CanSeal"], true);
        assert_eq!(value["CanStore"], false);
        assert_eq!(value.as_object().unwrap().len(), 4);
    }

    #[test]
    fn test_fresh_ids_differ() {
        assert_ne!(StorageMeta::new(true, true).id, StorageMeta::new(true, true).id);
    }

    #[tokio::test]
    async fn test_create_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let meta = StorageMeta::new(false, true);

        meta.create(dir.path()).await.unwrap();
        assert_eq!(StorageMeta::load(dir.path()).await.unwrap(), meta);

        let raw = std::fs::read_to_string(dir.path().join(META_FILE)).unwrap();
        assert!(raw.contains("\n  \"ID\": "));
    }

    #[tokio::test]
    async fn test_create_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let first = StorageMeta::new(true, true);
        first.create(dir.path()).await.unwrap();

        assert_matches!(
            StorageMeta::new(false, false).create(dir.path()).await,
            Err(AttachError::WriteMeta { source, .. }) if source.kind() == io::ErrorKind::AlreadyExists
        );
        assert_eq!(StorageMeta::load(dir.path()).await.unwrap(), first);
        // No temporary files are left behind.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_load_garbage() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(META_FILE), b"not json").unwrap();
        assert_matches!(
            StorageMeta::load(dir.path()).await,
            Err(AttachError::DecodeMeta { .. })
        );
    }
}
