//! Tessera CLI entry point.

use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use eyre::Result;
use tessera_node_core::{
    args::{DataDirArgs, LogArgs},
    config::NodeConfig,
    dirs::DataDirs,
    logging::init_logging,
    version::VERSION,
};
use tessera_sealing::AllocatorArgs;
use tessera_storage::StorageArgs;
use tracing::debug;

use crate::commands;

/// Tessera - sector admission, allocation and storage attachment
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct TesseraCli {
    /// Logging configuration (applies to all subcommands).
    #[command(flatten)]
    pub logs: LogArgs,

    /// Data directory configuration (applies to all subcommands).
    #[command(flatten)]
    pub datadir: DataDirArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: TesseraCommands,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum TesseraCommands {
    /// Attach the configured sealing and storage paths.
    Attach(AttachArgs),
    /// Allocate the next sector number and print it.
    NextId(NextIdArgs),
}

/// Arguments for the `attach` command.
#[derive(Debug, clap::Args)]
pub struct AttachArgs {
    /// Storage paths.
    #[command(flatten)]
    pub storage: StorageArgs,
}

/// Arguments for the `next-id` command.
#[derive(Debug, clap::Args)]
pub struct NextIdArgs {
    /// Sector number allocation.
    #[command(flatten)]
    pub allocator: AllocatorArgs,
}

/// Parse the command line, load configuration and dispatch.
pub async fn run() -> Result<()> {
    let matches = TesseraCli::command().get_matches();
    let cli = TesseraCli::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());

    let dirs = DataDirs::new(&cli.datadir)?;
    let mut config = NodeConfig::load_or_create(dirs.config_file())?;

    config.apply_log_args(&matches, &cli.logs);
    if let Some((_, sub)) = matches.subcommand() {
        match &cli.command {
            TesseraCommands::Attach(args) => config.apply_storage_args(sub, &args.storage),
            TesseraCommands::NextId(args) => config.apply_allocator_args(sub, &args.allocator),
        }
    }

    init_logging(&config.log)?;
    debug!(version = VERSION, datadir = %dirs.root.display(), "Starting tessera");

    match cli.command {
        TesseraCommands::Attach(_) => commands::attach(&dirs, &config).await,
        TesseraCommands::NextId(_) => commands::next_id(&dirs, &config).await,
    }
}
