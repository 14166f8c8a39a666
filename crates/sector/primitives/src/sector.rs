//! Sector identity and capacity.

use derive_more::{Display, From, Into};

use crate::{PaddedPieceSize, UnpaddedPieceSize};

/// Actor ID of the miner that owns a sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Into)]
#[display("f0{_0}")]
pub struct MinerId(pub u64);

/// Per-miner sector number.
///
/// Numbers are handed out once and never reused, whether or not the sector
/// they were issued for ever made it into the sealing pipeline.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Into,
)]
pub struct SectorNumber(pub u64);

impl SectorNumber {
    /// Returns the raw number.
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Globally unique sector identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[display("s-{miner}-{number}")]
pub struct SectorId {
    /// Owning miner.
    pub miner: MinerId,
    /// Sector number within the miner.
    pub number: SectorNumber,
}

impl SectorId {
    /// Create a sector id.
    pub const fn new(miner: MinerId, number: SectorNumber) -> Self {
        Self { miner, number }
    }
}

/// Padded capacity of a sector in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Into)]
pub struct SectorSize(pub u64);

impl SectorSize {
    /// 2 KiB sectors (devnets).
    pub const KIB_2: Self = Self(2 << 10);
    /// 8 MiB sectors.
    pub const MIB_8: Self = Self(8 << 20);
    /// 512 MiB sectors.
    pub const MIB_512: Self = Self(512 << 20);
    /// 32 GiB sectors.
    pub const GIB_32: Self = Self(32 << 30);
    /// 64 GiB sectors.
    pub const GIB_64: Self = Self(64 << 30);

    /// Returns the sector size in bytes.
    pub const fn bytes(self) -> u64 {
        self.0
    }

    /// The sector as a single padded piece.
    pub const fn padded(self) -> PaddedPieceSize {
        PaddedPieceSize(self.0)
    }

    /// Largest unpadded piece that fills the whole sector.
    pub const fn unpadded_capacity(self) -> UnpaddedPieceSize {
        self.padded().unpadded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let id = SectorId::new(MinerId(1000), SectorNumber(12));
        assert_eq!(id.to_string(), "s-f01000-12");
    }

    #[test]
    fn test_sector_ordering() {
        assert!(SectorNumber(3) < SectorNumber(4));
        assert_eq!(SectorNumber::from(9u64).get(), 9);
    }

    #[test]
    fn test_unpadded_capacity() {
        assert_eq!(SectorSize::KIB_2.unpadded_capacity(), UnpaddedPieceSize(2032));
        assert_eq!(SectorSize::GIB_32.unpadded_capacity(), UnpaddedPieceSize(34_091_302_912));
    }
}
