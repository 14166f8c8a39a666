//! Constants used throughout the node.

/// Default data directory name when no platform directory can be resolved.
pub const DEFAULT_DATA_DIR_NAME: &str = ".tessera";

/// Configuration file name inside the data directory.
pub const CONFIG_FILE_NAME: &str = "tessera.toml";

/// Sector counter database file name inside the data directory.
pub const COUNTER_DB_FILE_NAME: &str = "sectors.redb";
