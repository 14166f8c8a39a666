//! Idempotent storage path attachment.

use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use tessera_api::StorageSubsystem;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{AttachError, AttachResult, StorageMeta};

/// Expand `~` and environment variables in `path` and make it absolute.
pub fn expand_path(path: &Path) -> AttachResult<PathBuf> {
    let raw = path.to_str().ok_or_else(|| AttachError::Expand {
        path: path.to_string_lossy().into_owned(),
        reason: "path is not valid UTF-8".to_string(),
    })?;
    let expanded = shellexpand::full(raw).map_err(|e| AttachError::Expand {
        path: raw.to_string(),
        reason: e.to_string(),
    })?;
    let expanded = PathBuf::from(expanded.into_owned());
    std::path::absolute(&expanded).map_err(|e| AttachError::Expand {
        path: raw.to_string(),
        reason: e.to_string(),
    })
}

/// What [`StorageAttacher::attach`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachOutcome {
    /// New descriptor written and path registered.
    Created(StorageMeta),
    /// Existing descriptor kept, path registered.
    Registered(StorageMeta),
    /// Path was already known; nothing changed.
    AlreadyAttached(StorageMeta),
}

impl AttachOutcome {
    /// The path's descriptor.
    pub fn meta(&self) -> &StorageMeta {
        match self {
            Self::Created(meta) | Self::Registered(meta) | Self::AlreadyAttached(meta) => meta,
        }
    }
}

/// Attaches local directories to a [`StorageSubsystem`].
///
/// Attaches through one attacher (or its clones) run one at a time, so a
/// path is registered at most once per process. A descriptor written by
/// another process between the existence check and the write is reused.
#[derive(Debug)]
pub struct StorageAttacher<S: ?Sized> {
    storage: Arc<S>,
    lock: Arc<Mutex<()>>,
}

impl<S: ?Sized> Clone for StorageAttacher<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            lock: Arc::clone(&self.lock),
        }
    }
}

impl<S: StorageSubsystem + ?Sized> StorageAttacher<S> {
    /// Create an attacher registering paths with `storage`.
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            lock: Arc::default(),
        }
    }

    /// Attach `path` with the given capabilities.
    ///
    /// The directory is created if missing. A descriptor is written only if
    /// none exists; an existing one is never rewritten, even if its
    /// capabilities differ from the requested ones.
    pub async fn attach(
        &self,
        path: &Path,
        can_seal: bool,
        can_store: bool,
    ) -> AttachResult<AttachOutcome> {
        let dir = expand_path(path)?;
        self.attach_dir(&dir, can_seal, can_store).await
    }

    /// Attach the configured sealing and storage paths.
    ///
    /// Paths that expand to the same directory are attached once with both
    /// capabilities.
    pub async fn attach_configured(
        &self,
        seal: Option<&Path>,
        store: Option<&Path>,
    ) -> AttachResult<Vec<AttachOutcome>> {
        let seal = seal.map(expand_path).transpose()?;
        let store = store.map(expand_path).transpose()?;

        match (seal, store) {
            (Some(seal), Some(store)) if seal == store => {
                Ok(vec![self.attach_dir(&seal, true, true).await?])
            }
            (seal, store) => {
                let mut outcomes = Vec::new();
                if let Some(seal) = seal {
                    outcomes.push(self.attach_dir(&seal, true, false).await?);
                }
                if let Some(store) = store {
                    outcomes.push(self.attach_dir(&store, false, true).await?);
                }
                Ok(outcomes)
            }
        }
    }

    async fn attach_dir(
        &self,
        dir: &Path,
        can_seal: bool,
        can_store: bool,
    ) -> AttachResult<AttachOutcome> {
        // Held from the existence check until registration.
        let _guard = self.lock.lock().await;

        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| AttachError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;

        let meta_path = StorageMeta::path_in(dir);
        let exists = match tokio::fs::metadata(&meta_path).await {
            Ok(_) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(source) => {
                return Err(AttachError::Stat {
                    path: meta_path,
                    source,
                });
            }
        };

        if !exists {
            let meta = StorageMeta::new(can_seal, can_store);
            match meta.create(dir).await {
                Ok(()) => {
                    self.storage.storage_add_local(dir).await?;
                    info!(
                        path = %dir.display(),
                        id = %meta.id,
                        can_seal,
                        can_store,
                        "Attached new storage path"
                    );
                    return Ok(AttachOutcome::Created(meta));
                }
                Err(AttachError::WriteMeta { source, .. })
                    if source.kind() == io::ErrorKind::AlreadyExists =>
                {
                    debug!(path = %dir.display(), "Storage metadata appeared while attaching");
                }
                Err(err) => return Err(err),
            }
        }

        let meta = StorageMeta::load(dir).await?;
        if meta.can_seal != can_seal || meta.can_store != can_store {
            warn!(
                path = %dir.display(),
                stored_can_seal = meta.can_seal,
                stored_can_store = meta.can_store,
                can_seal,
                can_store,
                "Storage path keeps its existing capabilities"
            );
        }

        let known = self.storage.storage_local().await?;
        if known.iter().any(|p| p == dir) {
            debug!(path = %dir.display(), "Storage path already attached");
            return Ok(AttachOutcome::AlreadyAttached(meta));
        }

        self.storage.storage_add_local(dir).await?;
        info!(path = %dir.display(), id = %meta.id, "Registered existing storage path");
        Ok(AttachOutcome::Registered(meta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::META_FILE;
    use assert_matches::assert_matches;
    use tessera_test_utils::MockStorageSubsystem;

    fn attacher() -> (StorageAttacher<MockStorageSubsystem>, Arc<MockStorageSubsystem>) {
        let storage = Arc::new(MockStorageSubsystem::new());
        (StorageAttacher::new(storage.clone()), storage)
    }

    #[tokio::test]
    async fn test_fresh_path_seal_only() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("seal");
        let (attacher, storage) = attacher();

        let outcome = attacher.attach(&dir, true, false).await.unwrap();
        assert_matches!(&outcome, AttachOutcome::Created(meta) => {
            assert!(meta.can_seal);
            assert!(!meta.can_store);
            assert_eq!(meta.weight, 10);
        });

        assert_eq!(StorageMeta::load(&dir).await.unwrap(), *outcome.meta());
        assert_eq!(storage.add_calls(), vec![dir]);
    }

    #[tokio::test]
    async fn test_creates_nested_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("a/b/c");
        let (attacher, _) = attacher();

        attacher.attach(&dir, false, true).await.unwrap();
        assert!(dir.join(META_FILE).is_file());
    }

    #[tokio::test]
    async fn test_reattach_known_path_is_noop() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().to_path_buf();
        let (attacher, storage) = attacher();

        let first = attacher.attach(&dir, true, true).await.unwrap();
        let raw = std::fs::read(dir.join(META_FILE)).unwrap();

        let second = attacher.attach(&dir, true, true).await.unwrap();
        assert_matches!(&second, AttachOutcome::AlreadyAttached(_));
        assert_eq!(second.meta(), first.meta());
        assert_eq!(storage.add_calls().len(), 1);
        assert_eq!(std::fs::read(dir.join(META_FILE)).unwrap(), raw);
    }

    #[tokio::test]
    async fn test_existing_meta_unknown_path_registers() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().to_path_buf();
        let existing = StorageMeta::new(true, false);
        existing.create(&dir).await.unwrap();
        let (attacher, storage) = attacher();

        let outcome = attacher.attach(&dir, true, false).await.unwrap();
        assert_eq!(outcome, AttachOutcome::Registered(existing.clone()));
        assert_eq!(storage.add_calls(), vec![dir.clone()]);
        assert_eq!(StorageMeta::load(&dir).await.unwrap(), existing);
    }

    #[tokio::test]
    async fn test_capability_mismatch_keeps_meta() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().to_path_buf();
        let (attacher, storage) = attacher();

        let first = attacher.attach(&dir, true, false).await.unwrap();
        let second = attacher.attach(&dir, false, true).await.unwrap();

        assert_matches!(&second, AttachOutcome::AlreadyAttached(meta) => {
            assert!(meta.can_seal);
            assert!(!meta.can_store);
        });
        assert_eq!(second.meta().id, first.meta().id);
        assert_eq!(storage.add_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_dual_capability_single_registration() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("both");
        let (attacher, storage) = attacher();

        let outcomes = attacher
            .attach_configured(Some(&dir), Some(&dir))
            .await
            .unwrap();
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].meta().can_seal);
        assert!(outcomes[0].meta().can_store);
        assert_eq!(storage.add_calls(), vec![dir.clone()]);

        let metas: Vec<_> = std::fs::read_dir(&dir)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name() == META_FILE)
            .collect();
        assert_eq!(metas.len(), 1);
    }

    #[tokio::test]
    async fn test_separate_seal_and_store() {
        let tmp = tempfile::tempdir().unwrap();
        let seal = tmp.path().join("seal");
        let store = tmp.path().join("store");
        let (attacher, storage) = attacher();

        let outcomes = attacher
            .attach_configured(Some(&seal), Some(&store))
            .await
            .unwrap();
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].meta().can_seal && !outcomes[0].meta().can_store);
        assert!(!outcomes[1].meta().can_seal && outcomes[1].meta().can_store);
        assert_eq!(storage.add_calls(), vec![seal, store]);
    }

    #[tokio::test]
    async fn test_nothing_configured() {
        let (attacher, storage) = attacher();
        assert!(attacher.attach_configured(None, None).await.unwrap().is_empty());
        assert!(storage.add_calls().is_empty());
    }

    #[tokio::test]
    async fn test_registration_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let (attacher, storage) = attacher();
        storage.fail_add(true);

        assert_matches!(
            attacher.attach(tmp.path(), true, true).await,
            Err(AttachError::Storage(_))
        );
    }

    #[tokio::test]
    async fn test_known_path_with_existing_meta() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().to_path_buf();
        let existing = StorageMeta::new(false, true);
        existing.create(&dir).await.unwrap();
        let storage = Arc::new(MockStorageSubsystem::with_paths([dir.clone()]));
        let attacher = StorageAttacher::new(storage.clone());

        let outcome = attacher.attach(&dir, false, true).await.unwrap();
        assert_eq!(outcome, AttachOutcome::AlreadyAttached(existing));
        assert!(storage.add_calls().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_attach_registers_once() {
        for _ in 0..20 {
            let tmp = tempfile::tempdir().unwrap();
            let dir = tmp.path().join("shared");
            let (attacher, storage) = attacher();

            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let attacher = attacher.clone();
                    let dir = dir.clone();
                    tokio::spawn(async move { attacher.attach(&dir, true, true).await })
                })
                .collect();

            let mut outcomes = Vec::new();
            for handle in handles {
                outcomes.push(handle.await.unwrap().unwrap());
            }

            let created = outcomes
                .iter()
                .filter(|o| matches!(o, AttachOutcome::Created(_)))
                .count();
            assert_eq!(created, 1);
            let id = outcomes[0].meta().id;
            assert!(outcomes.iter().all(|o| o.meta().id == id));
            assert_eq!(storage.add_calls(), vec![dir]);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_share_descriptor() {
        // Separate attachers do not share a lock, like two processes.
        for _ in 0..20 {
            let tmp = tempfile::tempdir().unwrap();
            let dir = tmp.path().join("shared");
            let storage = Arc::new(MockStorageSubsystem::new());
            let a = StorageAttacher::new(storage.clone());
            let b = StorageAttacher::new(storage.clone());

            let (first, second) = tokio::join!(
                tokio::spawn({
                    let dir = dir.clone();
                    async move { a.attach(&dir, true, true).await }
                }),
                tokio::spawn({
                    let dir = dir.clone();
                    async move { b.attach(&dir, true, true).await }
                }),
            );
            let first = first.unwrap().unwrap();
            let second = second.unwrap().unwrap();

            assert_eq!(first.meta().id, second.meta().id);
            assert_eq!(StorageMeta::load(&dir).await.unwrap().id, first.meta().id);
            assert_eq!(storage.paths(), vec![dir]);
        }
    }

    #[tokio::test]
    async fn test_configured_paths_compared_after_expansion() {
        let home = PathBuf::from(shellexpand::tilde("~").into_owned());
        let tmp = tempfile::tempdir_in(&home).unwrap();
        let relative = tmp.path().strip_prefix(&home).unwrap();
        let tilde = PathBuf::from("~").join(relative);
        let absolute = tmp.path().to_path_buf();
        let (attacher, storage) = attacher();

        let outcomes = attacher
            .attach_configured(Some(&tilde), Some(&absolute))
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].meta().can_seal);
        assert!(outcomes[0].meta().can_store);
        assert_eq!(storage.add_calls(), vec![absolute]);
    }

    #[tokio::test]
    async fn test_list_failure() {
        let tmp = tempfile::tempdir().unwrap();
        StorageMeta::new(true, true).create(tmp.path()).await.unwrap();
        let (attacher, storage) = attacher();
        storage.fail_list(true);

        assert_matches!(
            attacher.attach(tmp.path(), true, true).await,
            Err(AttachError::Storage(_))
        );
        assert!(storage.add_calls().is_empty());
    }

    #[tokio::test]
    async fn test_path_is_a_file() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("plain");
        std::fs::write(&file, b"x").unwrap();
        let (attacher, _) = attacher();

        assert_matches!(
            attacher.attach(&file, true, true).await,
            Err(AttachError::CreateDir { .. })
        );
    }

    #[test]
    fn test_expand_unknown_var() {
        assert_matches!(
            expand_path(Path::new("$TESSERA_SURELY_UNSET_VAR/x")),
            Err(AttachError::Expand { .. })
        );
    }

    #[test]
    fn test_expand_relative_becomes_absolute() {
        assert!(expand_path(Path::new("some/dir")).unwrap().is_absolute());
    }
}
