//! Sealing backend boundary.

use async_trait::async_trait;
use tessera_primitives::{Piece, PieceInfo, SectorId, SectorNumber, SectorSize, UnpaddedPieceSize};
use tokio::io::AsyncRead;

use crate::BackendResult;

/// Piece payload handed to [`SealingBackend::add_piece`].
pub type PieceReader = Box<dyn AsyncRead + Send + Unpin>;

/// The sealing pipeline as seen by the pledge workflow.
///
/// Calls carry no cancellation: once issued they run to completion or
/// failure.
#[async_trait]
pub trait SealingBackend: Send + Sync + 'static {
    /// Padded size of the sectors this backend seals.
    fn sector_size(&self) -> SectorSize;

    /// Initialise on-disk state for a new sector.
    async fn new_sector(&self, sector: SectorId) -> BackendResult<()>;

    /// Write a piece into the sector's unsealed data.
    ///
    /// `existing` lists the unpadded sizes of pieces already in the sector,
    /// in order.
    async fn add_piece(
        &self,
        sector: SectorId,
        existing: &[UnpaddedPieceSize],
        size: UnpaddedPieceSize,
        data: PieceReader,
    ) -> BackendResult<PieceInfo>;

    /// Hand a sector filled with committed-capacity pieces to the sealing
    /// state machine.
    async fn register_committed_capacity(
        &self,
        number: SectorNumber,
        pieces: Vec<Piece>,
    ) -> BackendResult<()>;
}
