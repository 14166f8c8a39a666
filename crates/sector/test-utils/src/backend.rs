//! Recording sealing backend.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tessera_api::{BackendError, BackendResult, PieceReader, SealingBackend};
use tessera_primitives::{
    Piece, PieceCommitment, PieceInfo, SectorId, SectorNumber, SectorSize, UnpaddedPieceSize,
};
use tokio::io::AsyncReadExt;

/// A call accepted by [`MockSealingBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    /// `new_sector`.
    NewSector(SectorId),
    /// `add_piece`, with what was read from the piece data.
    AddPiece {
        /// Target sector.
        sector: SectorId,
        /// Sizes of the pieces already in the sector.
        existing: Vec<UnpaddedPieceSize>,
        /// Requested piece size.
        size: UnpaddedPieceSize,
        /// Bytes read from the data reader.
        bytes_read: u64,
        /// Whether every byte read was zero.
        all_zero: bool,
    },
    /// `register_committed_capacity`.
    Register {
        /// Registered sector number.
        number: SectorNumber,
        /// Pieces handed over.
        pieces: Vec<Piece>,
    },
}

/// Sealing backend that records calls and can be told to fail.
///
/// Failed calls are not recorded. Pieces whose padded size is not a valid
/// piece size are rejected.
#[derive(Debug)]
pub struct MockSealingBackend {
    sector_size: SectorSize,
    calls: Mutex<Vec<BackendCall>>,
    fail_new_sector: AtomicBool,
    fail_add_piece: AtomicBool,
    fail_register: AtomicBool,
}

impl MockSealingBackend {
    /// Backend sealing sectors of `sector_size`.
    pub fn new(sector_size: SectorSize) -> Self {
        Self {
            sector_size,
            calls: Mutex::new(Vec::new()),
            fail_new_sector: AtomicBool::new(false),
            fail_add_piece: AtomicBool::new(false),
            fail_register: AtomicBool::new(false),
        }
    }

    /// Toggle failure of `new_sector`.
    pub fn fail_new_sector(&self, fail: bool) {
        self.fail_new_sector.store(fail, Ordering::SeqCst);
    }

    /// Toggle failure of `add_piece`.
    pub fn fail_add_piece(&self, fail: bool) {
        self.fail_add_piece.store(fail, Ordering::SeqCst);
    }

    /// Toggle failure of `register_committed_capacity`.
    pub fn fail_register(&self, fail: bool) {
        self.fail_register.store(fail, Ordering::SeqCst);
    }

    /// Accepted calls, in order.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().clone()
    }

    /// Sector numbers registered with the pipeline.
    pub fn registered(&self) -> Vec<SectorNumber> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                BackendCall::Register { number, .. } => Some(*number),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: BackendCall) {
        self.calls.lock().push(call);
    }
}

/// Deterministic stand-in for a piece commitment.
fn fake_commitment(sector: SectorId, size: UnpaddedPieceSize) -> PieceCommitment {
    let mut out = [0u8; 32];
    let seed = sector
        .number
        .get()
        .to_le_bytes()
        .into_iter()
        .chain(size.0.to_le_bytes())
        .chain(sector.miner.0.to_le_bytes());
    for (dst, src) in out.iter_mut().zip(seed) {
        *dst = src;
    }
    PieceCommitment(out)
}

#[async_trait]
impl SealingBackend for MockSealingBackend {
    fn sector_size(&self) -> SectorSize {
        self.sector_size
    }

    async fn new_sector(&self, sector: SectorId) -> BackendResult<()> {
        if self.fail_new_sector.load(Ordering::SeqCst) {
            return Err(BackendError::Rejected {
                sector,
                reason: "injected new_sector failure".to_string(),
            });
        }
        self.record(BackendCall::NewSector(sector));
        Ok(())
    }

    async fn add_piece(
        &self,
        sector: SectorId,
        existing: &[UnpaddedPieceSize],
        size: UnpaddedPieceSize,
        mut data: PieceReader,
    ) -> BackendResult<PieceInfo> {
        if self.fail_add_piece.load(Ordering::SeqCst) {
            return Err(BackendError::Rejected {
                sector,
                reason: "injected add_piece failure".to_string(),
            });
        }
        size.validate().map_err(|err| BackendError::Rejected {
            sector,
            reason: err.to_string(),
        })?;

        let mut buf = vec![0u8; 64 << 10];
        let mut bytes_read = 0u64;
        let mut all_zero = true;
        loop {
            let n = data.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            all_zero &= buf.iter().take(n).all(|b| *b == 0);
            bytes_read += n as u64;
        }

        self.record(BackendCall::AddPiece {
            sector,
            existing: existing.to_vec(),
            size,
            bytes_read,
            all_zero,
        });
        Ok(PieceInfo {
            size: size.padded(),
            commitment: fake_commitment(sector, size),
        })
    }

    async fn register_committed_capacity(
        &self,
        number: SectorNumber,
        pieces: Vec<Piece>,
    ) -> BackendResult<()> {
        if self.fail_register.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable {
                reason: format!("injected register failure for sector {number}"),
            });
        }
        self.record(BackendCall::Register { number, pieces });
        Ok(())
    }
}
