//! Tessera API - boundaries to the collaborators of the sealing coordinator
//!
//! The coordinator decides *whether* and *with which number* a sector is
//! created; everything else is delegated through the traits in this crate.
//!
//! # Collaborators
//!
//! - [`SectorCounter`] - Persistent monotonic sector number source
//! - [`SealingBackend`] - Sector initialisation, piece creation and
//!   registration with the sealing pipeline
//! - [`StorageSubsystem`] - Registry of local storage paths
//!
//! # Design Principles
//!
//! - Traits define *what*, implementations define *how*
//! - No transport concepts (JSON-RPC, HTTP) leak into the API
//! - Every collaborator failure is a typed error, never a panic

#![warn(missing_docs)]

mod counter;
mod error;
mod sealing;
mod storage;

pub use counter::*;
pub use error::*;
pub use sealing::*;
pub use storage::*;
