//! Primitive types for sectors and pieces.
//!
//! This crate provides the value types shared by the sealing and storage
//! crates, kept separate to avoid circular dependencies.

mod piece;
mod sector;

pub use piece::*;
pub use sector::*;
