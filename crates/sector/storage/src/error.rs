//! Storage attachment errors.

use std::{io, path::PathBuf};

use tessera_api::StorageError;

/// Why a storage path could not be attached.
#[derive(Debug, thiserror::Error)]
pub enum AttachError {
    /// The path contains an unknown variable or is not valid UTF-8.
    #[error("expanding path {path:?}: {reason}")]
    Expand { path: String, reason: String },

    /// The directory could not be created.
    #[error("creating {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The metadata file exists but could not be inspected.
    #[error("stat {}: {source}", path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The metadata file could not be read.
    #[error("reading storage metadata {}: {source}", path.display())]
    ReadMeta {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The metadata file is not valid.
    #[error("decoding storage metadata {}: {source}", path.display())]
    DecodeMeta {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The metadata could not be serialised.
    #[error("marshaling storage config: {0}")]
    EncodeMeta(#[source] serde_json::Error),

    /// The metadata file could not be written.
    #[error("persisting storage metadata ({}): {source}", path.display())]
    WriteMeta {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The storage subsystem refused or failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result type for attachment operations.
pub type AttachResult<T> = Result<T, AttachError>;
