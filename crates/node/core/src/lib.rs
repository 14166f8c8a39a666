//! Node infrastructure library.
//!
//! - [`args`] - CLI argument structs for infrastructure configuration
//! - [`config`] - TOML configuration file with CLI overrides
//! - [`dirs`] - Data directory management
//! - [`logging`] - Logging initialization
//! - [`version`] - Version information

pub mod args;
pub mod config;
pub mod constants;
pub mod dirs;
pub mod logging;
pub mod version;
