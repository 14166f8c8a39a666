//! Node configuration handling.
//!
//! The TOML file provides the base values. Flags given on the command line
//! (or through their environment variable) override it; flags that were not
//! given keep the file's value, even though clap filled in a default.

use crate::args::LogArgs;
use clap::{ArgMatches, parser::ValueSource};
use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tessera_sealing::{AllocatorArgs, SealingArgs};
use tessera_storage::StorageArgs;
use tracing::debug;

/// Configuration for a tessera node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Logging configuration
    pub log: LogArgs,

    /// Sealing configuration
    pub sealing: SealingArgs,

    /// Storage paths attached at startup
    pub storage: StorageArgs,
}

impl NodeConfig {
    /// Load the configuration from the given path, or create a default one if it doesn't exist.
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let content = fs::read_to_string(path)
                .wrap_err_with(|| format!("reading {}", path.display()))?;
            let config: Self =
                toml::from_str(&content).wrap_err_with(|| format!("parsing {}", path.display()))?;
            debug!(path = %path.display(), "Loaded config file");
            Ok(config)
        } else {
            let config = Self::default();
            config.save(path)?;
            debug!(path = %path.display(), "Wrote default config file");
            Ok(config)
        }
    }

    /// Save the configuration to the given path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).wrap_err_with(|| format!("writing {}", path.display()))?;

        Ok(())
    }

    /// Override logging settings with the flags present in `matches`.
    pub fn apply_log_args(&mut self, matches: &ArgMatches, log: &LogArgs) {
        // CLI-only, never read from the file.
        self.log.verbosity = log.verbosity;
        if given(matches, "quiet") {
            self.log.quiet = log.quiet;
        }
        if given(matches, "filter") {
            self.log.filter.clone_from(&log.filter);
        }
        if given(matches, "json") {
            self.log.json = log.json;
        }
    }

    /// Override sector number allocation settings with the flags present in `matches`.
    pub fn apply_allocator_args(&mut self, matches: &ArgMatches, args: &AllocatorArgs) {
        let alloc = &mut self.sealing.allocation;
        if given(matches, "miner") {
            alloc.miner = args.miner;
        }
        if given(matches, "allocator") {
            alloc.allocator = args.allocator;
        }
        if given(matches, "server_address") {
            alloc.server_address.clone_from(&args.server_address);
        }
        if given(matches, "allocator_timeout_secs") {
            alloc.allocator_timeout_secs = args.allocator_timeout_secs;
        }
    }

    /// Override sealing settings with the flags present in `matches`.
    pub fn apply_sealing_args(&mut self, matches: &ArgMatches, args: &SealingArgs) {
        self.apply_allocator_args(matches, &args.allocation);
        if given(matches, "max_sealing_sectors") {
            self.sealing.max_sealing_sectors = args.max_sealing_sectors;
        }
    }

    /// Override storage paths with the flags present in `matches`.
    pub fn apply_storage_args(&mut self, matches: &ArgMatches, args: &StorageArgs) {
        if given(matches, "seal") {
            self.storage.seal.clone_from(&args.seal);
        }
        if given(matches, "store") {
            self.storage.store.clone_from(&args.store);
        }
    }
}

/// Whether the argument `id` was set by the user rather than by its default.
fn given(matches: &ArgMatches, id: &str) -> bool {
    matches
        .value_source(id)
        .is_some_and(|source| source != ValueSource::DefaultValue)
}
