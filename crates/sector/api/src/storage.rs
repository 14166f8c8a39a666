//! Storage subsystem boundary.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::StorageResult;

/// Registry of local storage paths.
#[async_trait]
pub trait StorageSubsystem: Send + Sync {
    /// Register a local path as sealing and/or storage target.
    ///
    /// The capabilities are read from the metadata file inside the path.
    async fn storage_add_local(&self, path: &Path) -> StorageResult<()>;

    /// Paths currently known to the subsystem.
    async fn storage_local(&self) -> StorageResult<Vec<PathBuf>>;
}
