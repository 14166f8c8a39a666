//! Sealing error types.

use tessera_api::{BackendError, CounterError};
use tessera_primitives::SectorId;

/// Errors returned synchronously to callers of the sealing crate.
#[derive(Debug, thiserror::Error)]
pub enum SealingError {
    /// Sealing concurrency ceiling reached. Nothing was consumed; retry later.
    #[error("too many sectors sealing (curSealing: {current}, max: {max})")]
    AdmissionDenied { current: u64, max: u64 },

    /// Configuration is unusable.
    #[error("invalid sealing config: {0}")]
    Config(String),
}

/// Errors from obtaining a sector number.
///
/// No sector number is consumed when allocation fails.
#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    /// The HTTP client could not be built.
    #[error("building http client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request did not complete (connect failure, timeout, ...).
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with something other than 200.
    #[error("non-200 code from {url}: {status}")]
    Status { url: String, status: u16 },

    /// The response body could not be read.
    #[error("reading response body: {0}")]
    Body(#[source] reqwest::Error),

    /// The response body is not a sector number.
    #[error("malformed sector number: {body:?}")]
    Malformed { body: String },

    /// The local counter failed.
    #[error("sector counter: {0}")]
    Counter(#[from] CounterError),

    /// The blocking counter task did not complete.
    #[error("sector counter task failed: {0}")]
    Join(String),
}

/// Step of a pledge at which it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum PledgeStage {
    /// Obtaining the sector number.
    Allocate,
    /// Initialising the sector on the backend.
    NewSector,
    /// Writing the synthetic piece.
    AddPiece,
    /// Handing the sector to the sealing pipeline.
    Register,
}

/// Terminal failure of a background pledge.
#[derive(Debug, thiserror::Error)]
pub enum PledgeError {
    /// No sector number could be obtained.
    #[error("get next sector id: {0}")]
    Allocation(#[from] AllocationError),

    /// The sealing backend failed after a number was allocated. The number
    /// is burned.
    #[error("{stage} failed for {sector}: {source}")]
    Backend {
        stage: PledgeStage,
        sector: SectorId,
        #[source]
        source: BackendError,
    },
}

impl PledgeError {
    /// The step the pledge failed at.
    pub fn stage(&self) -> PledgeStage {
        match self {
            Self::Allocation(_) => PledgeStage::Allocate,
            Self::Backend { stage, .. } => *stage,
        }
    }
}
