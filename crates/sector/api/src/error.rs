//! Error types for collaborator operations.
//!
//! Each collaborator has its own error so callers can tell a counter failure
//! (no number issued) from a backend failure (number already burned).

use std::{path::PathBuf, string::String};

use tessera_primitives::SectorId;

/// Error from a [`SectorCounter`](crate::SectorCounter).
#[derive(Debug, thiserror::Error)]
pub enum CounterError {
    /// Underlying database failed.
    #[error("database error: {0}")]
    Database(String),

    /// The counter reached `u64::MAX`.
    #[error("sector number space exhausted")]
    Exhausted,
}

/// Result type for counter operations.
pub type CounterResult<T> = core::result::Result<T, CounterError>;

/// Error from a [`SealingBackend`](crate::SealingBackend).
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The backend refused an operation on a sector.
    #[error("sector {sector} rejected: {reason}")]
    Rejected {
        /// The sector the operation targeted.
        sector: SectorId,
        /// Description of the rejection.
        reason: String,
    },

    /// The backend could not be reached.
    #[error("sealing backend unavailable: {reason}")]
    Unavailable {
        /// Description of the failure.
        reason: String,
    },

    /// Reading piece data failed.
    #[error("piece data: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for sealing backend operations.
pub type BackendResult<T> = core::result::Result<T, BackendError>;

/// Error from a [`StorageSubsystem`](crate::StorageSubsystem).
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The path cannot be used as local storage.
    #[error("invalid storage path {}: {reason}", path.display())]
    InvalidPath {
        /// The rejected path.
        path: PathBuf,
        /// Why it was rejected.
        reason: String,
    },

    /// The subsystem failed to process the request.
    #[error("storage subsystem error: {message}")]
    Rpc {
        /// Description of the failure.
        message: String,
    },

    /// Reading or writing subsystem state failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage subsystem operations.
pub type StorageResult<T> = core::result::Result<T, StorageError>;
