//! Pieces and piece sizes.
//!
//! Sector data is laid out as Fr32-padded pieces: every 127 bytes of payload
//! take 128 bytes on disk. [`UnpaddedPieceSize`] is the payload size,
//! [`PaddedPieceSize`] the on-disk size.

use core::fmt;

use derive_more::{Display, From, Into};

/// Errors from piece size validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PieceSizeError {
    /// Padded size is below the 128 byte minimum.
    #[error("padded piece size {0} is smaller than 128 bytes")]
    TooSmall(u64),

    /// Padded size is not a power of two.
    #[error("padded piece size {0} is not a power of two")]
    NotPowerOfTwo(u64),
}

/// Piece size before Fr32 padding.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Into,
)]
pub struct UnpaddedPieceSize(pub u64);

impl UnpaddedPieceSize {
    /// Size after padding.
    pub const fn padded(self) -> PaddedPieceSize {
        PaddedPieceSize(self.0 + self.0 / 127)
    }

    /// Checks that this size maps onto a valid padded size.
    pub fn validate(self) -> Result<(), PieceSizeError> {
        self.padded().validate()
    }
}

/// Piece size after Fr32 padding.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Into,
)]
pub struct PaddedPieceSize(pub u64);

impl PaddedPieceSize {
    /// Size before padding.
    pub const fn unpadded(self) -> UnpaddedPieceSize {
        UnpaddedPieceSize(self.0 - self.0 / 128)
    }

    /// Padded sizes must be a power of two of at least 128 bytes.
    pub fn validate(self) -> Result<(), PieceSizeError> {
        if self.0 < 128 {
            return Err(PieceSizeError::TooSmall(self.0));
        }
        if !self.0.is_power_of_two() {
            return Err(PieceSizeError::NotPowerOfTwo(self.0));
        }
        Ok(())
    }
}

/// Piece commitment (CommP) as raw 32 bytes.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, From, Into)]
pub struct PieceCommitment(pub [u8; 32]);

impl fmt::Display for PieceCommitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for PieceCommitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PieceCommitment({self})")
    }
}

/// A piece committed into a sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PieceInfo {
    /// Padded size of the piece.
    pub size: PaddedPieceSize,
    /// Commitment over the piece data.
    pub commitment: PieceCommitment,
}

/// On-chain deal identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Into)]
pub struct DealId(pub u64);

/// Deal metadata attached to a piece holding client data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DealInfo {
    /// Deal the piece belongs to.
    pub deal_id: DealId,
    /// First epoch the deal must be provable.
    pub start_epoch: i64,
    /// Last epoch of the deal.
    pub end_epoch: i64,
}

/// A piece as handed to the sealing pipeline.
///
/// Synthetic (committed-capacity) pieces carry no deal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    /// The committed piece.
    pub piece: PieceInfo,
    /// Deal metadata, `None` for synthetic pieces.
    pub deal_info: Option<DealInfo>,
}

impl Piece {
    /// Wrap a piece that holds no deal data.
    pub const fn committed_capacity(piece: PieceInfo) -> Self {
        Self {
            piece,
            deal_info: None,
        }
    }

    /// Whether this piece holds deal data.
    pub const fn has_deal(&self) -> bool {
        self.deal_info.is_some()
    }
}
