//! Sealing admission control.

use crate::SealingError;

/// Decide whether one more sector may start sealing.
///
/// `current` is the number of sectors sealing right now. The check is made
/// against the count the new sector would produce, so `current >= max` is
/// denied. `max == 0` means unlimited.
///
/// Pure function: the count itself is owned by [`SealingStats`](crate::SealingStats).
pub fn admit(current: u64, max: u64) -> Result<(), SealingError> {
    if max == 0 {
        return Ok(());
    }
    if current >= max {
        return Err(SealingError::AdmissionDenied { current, max });
    }
    Ok(())
}
