//! Local storage attachment.
//!
//! A storage path is a directory that carries a `sectorstore.json`
//! descriptor ([`StorageMeta`]) and is registered with the node's storage
//! subsystem. [`StorageAttacher`] makes attaching a path idempotent;
//! [`LocalStorageIndex`] is a file-backed storage subsystem for standalone
//! nodes.

mod args;
mod attach;
mod error;
mod index;
mod meta;

pub use args::StorageArgs;
pub use attach::{AttachOutcome, StorageAttacher, expand_path};
pub use error::{AttachError, AttachResult};
pub use index::{INDEX_FILE, LocalStorageIndex};
pub use meta::{DEFAULT_WEIGHT, META_FILE, StorageId, StorageMeta};
