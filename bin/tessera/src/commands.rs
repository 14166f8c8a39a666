//! Command implementations.

use std::sync::Arc;

use eyre::{Result, WrapErr};
use tessera_counter::RedbSectorCounter;
use tessera_node_core::{config::NodeConfig, dirs::DataDirs};
use tessera_sealing::{
    AllocationStrategy, LocalAllocator, RemoteAllocator, SectorIdAllocator,
};
use tessera_storage::{AttachOutcome, LocalStorageIndex, StorageAttacher};
use tessera_tasks::TaskManager;
use tracing::{info, warn};

/// Attach the configured storage paths to the local storage index.
pub(crate) async fn attach(dirs: &DataDirs, config: &NodeConfig) -> Result<()> {
    if config.storage.is_empty() {
        warn!("No storage paths configured; pass --storage.seal and/or --storage.store");
        return Ok(());
    }

    let index = Arc::new(
        LocalStorageIndex::open(dirs.storage_index())
            .await
            .wrap_err("opening storage index")?,
    );
    let attacher = StorageAttacher::new(index);

    let outcomes = attacher
        .attach_configured(config.storage.seal.as_deref(), config.storage.store.as_deref())
        .await?;

    for outcome in outcomes {
        let meta = outcome.meta();
        let action = match &outcome {
            AttachOutcome::Created(_) => "created",
            AttachOutcome::Registered(_) => "registered",
            AttachOutcome::AlreadyAttached(_) => "already attached",
        };
        info!(
            id = %meta.id,
            can_seal = meta.can_seal,
            can_store = meta.can_store,
            "Storage path {action}"
        );
    }
    Ok(())
}

/// Allocate one sector number with the configured strategy and print it.
pub(crate) async fn next_id(dirs: &DataDirs, config: &NodeConfig) -> Result<()> {
    let sealing = config.sealing.to_config()?;
    let tasks = TaskManager::current();

    let allocator = match &sealing.strategy {
        AllocationStrategy::Local => {
            let counter = RedbSectorCounter::open(dirs.counter_db())
                .wrap_err_with(|| format!("opening {}", dirs.counter_db().display()))?;
            SectorIdAllocator::Local(LocalAllocator::new(Arc::new(counter), tasks.executor()))
        }
        AllocationStrategy::Remote(endpoint) => {
            SectorIdAllocator::Remote(RemoteAllocator::new(endpoint, sealing.remote_timeout)?)
        }
    };

    let number = allocator.next().await?;
    info!(%number, strategy = allocator.strategy(), miner = %sealing.miner, "Allocated sector number");
    println!("{number}");
    Ok(())
}
