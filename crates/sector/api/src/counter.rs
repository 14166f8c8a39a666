//! Persistent sector number source.

use tessera_primitives::SectorNumber;

use crate::CounterResult;

/// Monotonic sector number counter.
///
/// Implementations are responsible for durability: a number returned by
/// [`next`](Self::next) must never be returned again, including after a
/// process restart.
///
/// # Thread Safety
///
/// Implementations must be thread-safe (Send + Sync).
#[auto_impl::auto_impl(&, Box, Arc)]
pub trait SectorCounter: Send + Sync {
    /// Issue the next sector number.
    fn next(&self) -> CounterResult<SectorNumber>;
}
