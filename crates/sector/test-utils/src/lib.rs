//! Test utilities for tessera crates.
//!
//! In-memory stand-ins for the collaborators defined in `tessera-api`:
//!
//! - [`MemorySectorCounter`] - counter whose state survives a simulated restart
//! - [`MockSealingBackend`] - records every accepted call, with failure injection
//! - [`MockStorageSubsystem`] - in-memory path registry

mod backend;
mod counter;
mod storage;

pub use backend::{BackendCall, MockSealingBackend};
pub use counter::MemorySectorCounter;
pub use storage::MockStorageSubsystem;
