//! Committed-capacity pledge workflow.

use std::sync::Arc;

use tessera_api::{BackendError, BackendResult, SealingBackend};
use tessera_primitives::{
    MinerId, Piece, PieceInfo, SectorId, SectorNumber, UnpaddedPieceSize,
};
use tessera_tasks::TaskExecutor;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, error, info, warn};

use crate::{
    PledgeError, PledgeStage, SealingConfig, SealingError, SealingSlot, SealingStats,
    SectorIdAllocator, metrics::PledgeMetrics, null_reader,
};

/// Result of one admitted pledge.
#[derive(Debug)]
pub struct PledgeOutcome {
    /// The sector, once a number was allocated.
    pub sector: Option<SectorId>,
    /// The registered sector number, or why the pledge stopped.
    pub result: Result<SectorNumber, PledgeError>,
}

/// Receiving side of the outcome channel. Exactly one outcome arrives per
/// admitted pledge.
pub type PledgeOutcomes = mpsc::UnboundedReceiver<PledgeOutcome>;

/// Add one zero-filled piece per entry of `sizes` to `sector`.
///
/// Each size is appended to `existing` once its piece is added, so later
/// pieces see the ones before them. An empty `sizes` adds nothing.
pub async fn pledge_pieces<B>(
    backend: &B,
    sector: SectorId,
    mut existing: Vec<UnpaddedPieceSize>,
    sizes: &[UnpaddedPieceSize],
) -> BackendResult<Vec<PieceInfo>>
where
    B: SealingBackend + ?Sized,
{
    if sizes.is_empty() {
        return Ok(Vec::new());
    }

    let mut out = Vec::with_capacity(sizes.len());
    for &size in sizes {
        let info = backend
            .add_piece(sector, &existing, size, Box::new(null_reader(size)))
            .await?;
        debug!(%sector, size = size.0, commitment = %info.commitment, "Added pledge piece");
        existing.push(size);
        out.push(info);
    }
    Ok(out)
}

struct Inner<B> {
    miner: MinerId,
    max_sealing: u64,
    backend: Arc<B>,
    allocator: SectorIdAllocator,
    stats: Arc<SealingStats>,
    outcomes: mpsc::UnboundedSender<PledgeOutcome>,
    metrics: PledgeMetrics,
}

/// Creates committed-capacity sectors on request.
///
/// [`pledge`](Self::pledge) decides admission synchronously and does the
/// rest on the executor. Cheap to clone.
pub struct PledgeWorkflow<B> {
    inner: Arc<Inner<B>>,
    executor: TaskExecutor,
}

impl<B> Clone for PledgeWorkflow<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            executor: self.executor.clone(),
        }
    }
}

impl<B: SealingBackend> PledgeWorkflow<B> {
    /// Create a workflow and the channel its outcomes are reported on.
    pub fn new(
        config: &SealingConfig,
        backend: Arc<B>,
        allocator: SectorIdAllocator,
        stats: Arc<SealingStats>,
        executor: TaskExecutor,
    ) -> (Self, PledgeOutcomes) {
        let (tx, rx) = mpsc::unbounded_channel();
        let inner = Inner {
            miner: config.miner,
            max_sealing: config.max_sealing_sectors,
            backend,
            allocator,
            stats,
            outcomes: tx,
            metrics: PledgeMetrics::default(),
        };
        (
            Self {
                inner: Arc::new(inner),
                executor,
            },
            rx,
        )
    }

    /// Sealing stats shared with the pipeline.
    pub fn stats(&self) -> &Arc<SealingStats> {
        &self.inner.stats
    }

    /// Start a pledge.
    ///
    /// Returns [`SealingError::AdmissionDenied`] without side effects when
    /// the sealing ceiling is reached. Otherwise the sector is built in the
    /// background and the handle of that task is returned; awaiting it is
    /// optional.
    pub fn pledge(&self) -> Result<JoinHandle<()>, SealingError> {
        let slot = match self.inner.stats.try_reserve(self.inner.max_sealing) {
            Ok(slot) => slot,
            Err(err) => {
                self.inner.metrics.denied.increment(1);
                warn!(%err, "Pledge denied");
                return Err(err);
            }
        };
        self.inner.metrics.accepted.increment(1);

        let inner = Arc::clone(&self.inner);
        Ok(self.executor.spawn(async move { inner.run(slot).await }))
    }
}

impl<B: SealingBackend> Inner<B> {
    async fn run(&self, slot: SealingSlot) {
        let (sector, result) = self.build().await;

        match &result {
            Ok(number) => {
                slot.commit();
                self.metrics.completed.increment(1);
                debug!(%number, "Pledged sector registered");
            }
            Err(err) => {
                drop(slot);
                self.metrics.failed(err.stage());
                debug!(stage = %err.stage(), "Pledge failed");
            }
        }

        // The receiver may be gone during shutdown; the outcome was logged.
        let _ = self.outcomes.send(PledgeOutcome { sector, result });
    }

    async fn build(&self) -> (Option<SectorId>, Result<SectorNumber, PledgeError>) {
        let number = match self.allocator.next().await {
            Ok(number) => number,
            Err(err) => return (None, Err(err.into())),
        };
        let sector = SectorId::new(self.miner, number);
        (Some(sector), self.fill(sector).await.map(|()| number))
    }

    async fn fill(&self, sector: SectorId) -> Result<(), PledgeError> {
        let at = move |stage: PledgeStage| {
            move |source: BackendError| PledgeError::Backend {
                stage,
                sector,
                source,
            }
        };

        self.backend
            .new_sector(sector)
            .await
            .map_err(at(PledgeStage::NewSector))?;

        let size = self.backend.sector_size().unpadded_capacity();
        let infos = pledge_pieces(self.backend.as_ref(), sector, Vec::new(), &[size])
            .await
            .map_err(at(PledgeStage::AddPiece))?;

        let pieces = infos.into_iter().map(Piece::committed_capacity).collect();
        self.backend
            .register_committed_capacity(sector.number, pieces)
            .await
            .map_err(at(PledgeStage::Register))
    }
}

/// Log every pledge outcome until all workflows are dropped.
pub fn spawn_outcome_logger(executor: &TaskExecutor, mut outcomes: PledgeOutcomes) -> JoinHandle<()> {
    executor.spawn(async move {
        while let Some(outcome) = outcomes.recv().await {
            match (outcome.sector, outcome.result) {
                (Some(sector), Ok(_)) => info!(%sector, "Pledged committed-capacity sector"),
                (Some(sector), Err(err)) => {
                    error!(%sector, stage = %err.stage(), %err, "Pledge failed, sector number burned")
                }
                (None, Err(err)) => error!(%err, "Pledge failed before a sector number was allocated"),
                (None, Ok(number)) => info!(%number, "Pledged committed-capacity sector"),
            }
        }
    })
}
