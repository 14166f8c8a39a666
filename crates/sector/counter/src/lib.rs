//! Persistent sector number counter.
//!
//! [`RedbSectorCounter`] implements [`SectorCounter`](tessera_api::SectorCounter)
//! on top of the redb embedded database, so the local allocation strategy
//! keeps issuing fresh numbers across restarts.

mod redb_counter;

pub use redb_counter::RedbSectorCounter;
