//! Committed-capacity sector pledging.
//!
//! A pledge creates a sector filled with synthetic zero data so the miner
//! can meet its proving obligations without client deals. This crate owns
//! the three decisions around it:
//!
//! - [`admit`] / [`SealingStats`] - may another sector start sealing?
//! - [`SectorIdAllocator`] - which sector number does it get?
//! - [`PledgeWorkflow`] - build the sector in the background and hand it to
//!   the sealing pipeline.
//!
//! Configuration is an explicit [`SealingConfig`] value, usually built from
//! [`SealingArgs`]. The sector number flags alone are [`AllocatorArgs`].

mod admission;
mod allocator;
mod args;
mod config;
mod error;
mod metrics;
mod null;
mod pledge;
mod stats;

pub use admission::admit;
pub use allocator::{LocalAllocator, RemoteAllocator, SectorIdAllocator, decode_sector_number};
pub use args::{AllocatorArgs, AllocatorKind, SealingArgs};
pub use config::{AllocationStrategy, RemoteEndpoint, SealingConfig};
pub use error::{AllocationError, PledgeError, PledgeStage, SealingError};
pub use null::null_reader;
pub use pledge::{
    PledgeOutcome, PledgeOutcomes, PledgeWorkflow, pledge_pieces, spawn_outcome_logger,
};
pub use stats::{SealingSlot, SealingStats};
