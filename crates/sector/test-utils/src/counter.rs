//! In-memory sector counter.

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use tessera_api::{CounterError, CounterResult, SectorCounter};
use tessera_primitives::SectorNumber;

/// Sector counter kept in memory.
///
/// Clones share state. [`restart`](Self::restart) returns a fresh handle
/// over the same persisted value, like reopening a database.
#[derive(Debug, Clone, Default)]
pub struct MemorySectorCounter {
    next: Arc<AtomicU64>,
    fail: Arc<AtomicBool>,
}

impl MemorySectorCounter {
    /// Counter starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter whose next number is `next`.
    pub fn starting_at(next: u64) -> Self {
        Self {
            next: Arc::new(AtomicU64::new(next)),
            fail: Arc::default(),
        }
    }

    /// Simulate a process restart: same stored value, failure toggle reset.
    pub fn restart(&self) -> Self {
        Self {
            next: Arc::clone(&self.next),
            fail: Arc::default(),
        }
    }

    /// How many numbers have been issued.
    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }

    /// Make subsequent calls fail without issuing a number.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl SectorCounter for MemorySectorCounter {
    fn next(&self) -> CounterResult<SectorNumber> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(CounterError::Database("injected failure".to_string()));
        }
        self.next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_add(1))
            .map(SectorNumber)
            .map_err(|_| CounterError::Exhausted)
    }
}
