//! Saved-video library storage.
//!
//! This crate provides:
//! - A JSON-file store of finished analyses keyed by video ID
//! - Listing, lookup, deletion and text search over saved records

pub mod error;
pub mod library;

pub use error::{StorageError, StorageResult};
pub use library::{LibraryConfig, LibraryStore};
