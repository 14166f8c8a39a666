//! In-memory storage subsystem.

use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use parking_lot::Mutex;
use tessera_api::{StorageError, StorageResult, StorageSubsystem};

/// Storage subsystem holding its path list in memory.
#[derive(Debug, Default)]
pub struct MockStorageSubsystem {
    paths: Mutex<Vec<PathBuf>>,
    add_calls: Mutex<Vec<PathBuf>>,
    fail_add: AtomicBool,
    fail_list: AtomicBool,
}

impl MockStorageSubsystem {
    /// Empty subsystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subsystem that already knows `paths`.
    pub fn with_paths(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            paths: Mutex::new(paths.into_iter().collect()),
            ..Default::default()
        }
    }

    /// Paths passed to `storage_add_local`, in order.
    pub fn add_calls(&self) -> Vec<PathBuf> {
        self.add_calls.lock().clone()
    }

    /// Known paths.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.paths.lock().clone()
    }

    /// Toggle failure of `storage_add_local`.
    pub fn fail_add(&self, fail: bool) {
        self.fail_add.store(fail, Ordering::SeqCst);
    }

    /// Toggle failure of `storage_local`.
    pub fn fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl StorageSubsystem for MockStorageSubsystem {
    async fn storage_add_local(&self, path: &Path) -> StorageResult<()> {
        self.add_calls.lock().push(path.to_path_buf());
        if self.fail_add.load(Ordering::SeqCst) {
            return Err(StorageError::Rpc {
                message: "injected add failure".to_string(),
            });
        }
        let mut paths = self.paths.lock();
        if !paths.iter().any(|p| p == path) {
            paths.push(path.to_path_buf());
        }
        Ok(())
    }

    async fn storage_local(&self) -> StorageResult<Vec<PathBuf>> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(StorageError::Rpc {
                message: "injected list failure".to_string(),
            });
        }
        Ok(self.paths.lock().clone())
    }
}
