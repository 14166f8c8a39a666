//! CLI argument structs for node infrastructure configuration.
//!
//! These args serve dual purposes:
//! - CLI parsing via clap (`#[derive(Args)]`)
//! - Configuration serialization via serde (`#[derive(Serialize, Deserialize)]`)
//!
//! Domain arguments live next to their crates (`tessera_sealing::SealingArgs`,
//! `tessera_storage::StorageArgs`).

mod datadir;
mod log;

pub use datadir::DataDirArgs;
pub use log::LogArgs;
