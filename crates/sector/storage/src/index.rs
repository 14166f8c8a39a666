//! File-backed storage path index.

use std::{
    io,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tessera_api::{StorageError, StorageResult, StorageSubsystem};
use tokio::sync::Mutex;
use tracing::debug;

use crate::StorageMeta;

/// Default file name of the index inside the data directory.
pub const INDEX_FILE: &str = "storage.json";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct IndexFile {
    #[serde(default)]
    storage_paths: Vec<PathEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PathEntry {
    path: PathBuf,
}

/// Storage subsystem that keeps its path list in a JSON file.
///
/// A path is accepted only if it holds a readable `sectorstore.json`.
#[derive(Debug)]
pub struct LocalStorageIndex {
    file: PathBuf,
    state: Mutex<IndexFile>,
}

impl LocalStorageIndex {
    /// Open the index at `file`, starting empty if it does not exist.
    pub async fn open(file: impl Into<PathBuf>) -> StorageResult<Self> {
        let file = file.into();
        let state = match tokio::fs::read(&file).await {
            Ok(raw) => serde_json::from_slice(&raw).map_err(|e| StorageError::Rpc {
                message: format!("decoding {}: {e}", file.display()),
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => IndexFile::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            file,
            state: Mutex::new(state),
        })
    }

    /// Location of the index file.
    pub fn file(&self) -> &Path {
        &self.file
    }

    async fn persist(&self, state: &IndexFile) -> StorageResult<()> {
        let encoded = serde_json::to_vec_pretty(state).map_err(|e| StorageError::Rpc {
            message: format!("encoding storage index: {e}"),
        })?;

        if let Some(parent) = self.file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.file.with_extension("json.tmp");
        tokio::fs::write(&tmp, encoded).await?;
        tokio::fs::rename(&tmp, &self.file).await?;
        Ok(())
    }
}

#[async_trait]
impl StorageSubsystem for LocalStorageIndex {
    async fn storage_add_local(&self, path: &Path) -> StorageResult<()> {
        let mut state = self.state.lock().await;
        if state.storage_paths.iter().any(|e| e.path == path) {
            return Ok(());
        }

        if let Err(e) = StorageMeta::load(path).await {
            return Err(StorageError::InvalidPath {
                path: path.to_path_buf(),
                reason: e.to_string(),
            });
        }

        state.storage_paths.push(PathEntry {
            path: path.to_path_buf(),
        });
        if let Err(e) = self.persist(&state).await {
            state.storage_paths.pop();
            return Err(e);
        }
        debug!(path = %path.display(), "Added local storage path to index");
        Ok(())
    }

    async fn storage_local(&self) -> StorageResult<Vec<PathBuf>> {
        Ok(self
            .state
            .lock()
            .await
            .storage_paths
            .iter()
            .map(|e| e.path.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AttachOutcome, StorageAttacher};
    use assert_matches::assert_matches;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let index = LocalStorageIndex::open(tmp.path().join(INDEX_FILE)).await.unwrap();
        assert!(index.storage_local().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_persists_across_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let store = tmp.path().join("store");
        std::fs::create_dir(&store).unwrap();
        StorageMeta::new(false, true).create(&store).await.unwrap();

        let file = tmp.path().join(INDEX_FILE);
        let index = LocalStorageIndex::open(&file).await.unwrap();
        index.storage_add_local(&store).await.unwrap();
        index.storage_add_local(&store).await.unwrap();
        assert_eq!(index.storage_local().await.unwrap(), vec![store.clone()]);

        let reopened = LocalStorageIndex::open(&file).await.unwrap();
        assert_eq!(reopened.storage_local().await.unwrap(), vec![store.clone()]);

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&file).unwrap()).unwrap();
        assert_eq!(
            raw["StoragePaths"][0]["Path"],
            serde_json::json!(store.to_str().unwrap())
        );
    }

    #[tokio::test]
    async fn test_rejects_path_without_meta() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join(INDEX_FILE);
        let index = LocalStorageIndex::open(&file).await.unwrap();

        assert_matches!(
            index.storage_add_local(tmp.path()).await,
            Err(StorageError::InvalidPath { .. })
        );
        assert!(index.storage_local().await.unwrap().is_empty());
        assert!(!file.exists());
    }

    #[tokio::test]
    async fn test_corrupt_index() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join(INDEX_FILE);
        std::fs::write(&file, b"{").unwrap();
        assert_matches!(
            LocalStorageIndex::open(&file).await,
            Err(StorageError::Rpc { .. })
        );
    }

    #[tokio::test]
    async fn test_attach_through_index() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("sealing");
        let index = Arc::new(
            LocalStorageIndex::open(tmp.path().join(INDEX_FILE))
                .await
                .unwrap(),
        );
        let attacher = StorageAttacher::new(index.clone());

        assert_matches!(
            attacher.attach(&path, true, false).await.unwrap(),
            AttachOutcome::Created(_)
        );
        assert_matches!(
            attacher.attach(&path, true, false).await.unwrap(),
            AttachOutcome::AlreadyAttached(_)
        );
        assert_eq!(index.storage_local().await.unwrap(), vec![path]);
    }
}
