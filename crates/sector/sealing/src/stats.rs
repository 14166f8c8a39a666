//! Sealing-in-progress accounting.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use crate::{SealingError, admit};

/// Number of sectors currently sealing.
///
/// [`try_reserve`](Self::try_reserve) makes the admission check and the
/// increment a single compare-and-swap, so concurrent pledges cannot
/// overshoot the ceiling.
#[derive(Debug, Default)]
pub struct SealingStats {
    sealing: AtomicU64,
}

impl SealingStats {
    /// Create empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sectors sealing right now, including reserved slots.
    pub fn cur_sealing(&self) -> u64 {
        self.sealing.load(Ordering::Acquire)
    }

    /// Reserve a sealing slot if [`admit`] allows it.
    pub fn try_reserve(self: &Arc<Self>, max: u64) -> Result<SealingSlot, SealingError> {
        let mut current = self.sealing.load(Ordering::Acquire);
        loop {
            admit(current, max)?;
            match self.sealing.compare_exchange_weak(
                current,
                current.saturating_add(1),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    return Ok(SealingSlot {
                        stats: Arc::clone(self),
                        committed: false,
                    });
                }
                Err(actual) => current = actual,
            }
        }
    }

    /// A sector left the sealing pipeline (sealed or aborted).
    pub fn sector_done(&self) {
        let _ = self
            .sealing
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                Some(n.saturating_sub(1))
            });
    }
}

/// A reserved sealing slot.
///
/// Dropping the slot releases it. [`commit`](Self::commit) hands it to the
/// sealing pipeline instead, which releases it with
/// [`SealingStats::sector_done`] once the sector is finished.
#[derive(Debug)]
#[must_use = "dropping a slot releases it immediately"]
pub struct SealingSlot {
    stats: Arc<SealingStats>,
    committed: bool,
}

impl SealingSlot {
    /// Keep the slot counted after this guard goes away.
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for SealingSlot {
    fn drop(&mut self) {
        if !self.committed {
            self.stats.sector_done();
        }
    }
}
