//! Data directory CLI arguments.

use clap::Args;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Data directory configuration.
#[derive(Debug, Args, Clone, Default, Serialize, Deserialize)]
#[command(next_help_heading = "Datadir")]
#[serde(default)]
pub struct DataDirArgs {
    /// Data directory for node state (config, sector counter, storage index).
    #[arg(long, value_name = "PATH", env = "TESSERA_DATADIR", global = true)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datadir: Option<PathBuf>,

    /// Configuration file. Defaults to `tessera.toml` in the data directory.
    #[arg(long, value_name = "FILE", global = true)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<PathBuf>,
}
