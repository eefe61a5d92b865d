//! Local tree scanning for cloudsync.
//!
//! Walks a local directory, maps every directory and regular file to its
//! destination object key, and partitions the result into a [`SyncPlan`]
//! for the executor.
//!
//! # Key Types
//!
//! - [`FileSystem`] -- Read capability over a tree (walk, open, stat)
//! - [`LocalFileSystem`] -- `walkdir`-backed implementation
//! - [`PathMapper`] -- Local path to object key, with prefix expansion
//! - [`SyncPlan`] -- Directory keys and file entries, in walk order

pub mod error;
pub mod fs;
pub mod mapper;
pub mod plan;

pub use error::{ScanError, ScanResult};
pub use fs::{FileSystem, LocalFileSystem, ScannedPath};
pub use mapper::PathMapper;
pub use plan::{scan_entries, FileEntry, SyncPlan};
