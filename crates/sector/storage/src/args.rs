//! Storage path CLI arguments.

use std::path::PathBuf;

use clap::Args;
use serde::{Deserialize, Serialize};

/// Local storage paths to attach at startup.
#[derive(Debug, Args, Clone, Default, Serialize, Deserialize)]
#[command(next_help_heading = "Storage")]
#[serde(default)]
pub struct StorageArgs {
    /// Directory to use for sealing. `~` and `$VARS` are expanded.
    #[arg(long = "storage.seal", value_name = "PATH")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seal: Option<PathBuf>,

    /// Directory to keep sealed sectors in. May equal the sealing path.
    #[arg(long = "storage.store", value_name = "PATH")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<PathBuf>,
}

impl StorageArgs {
    /// Whether any path is configured.
    pub fn is_empty(&self) -> bool {
        self.seal.is_none() && self.store.is_none()
    }
}
