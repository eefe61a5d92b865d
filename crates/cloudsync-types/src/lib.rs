//! Foundation types for cloudsync.
//!
//! This crate provides the identity and structural types shared by every
//! other cloudsync crate: how a local tree entry is described, how its
//! destination is addressed in the object store, and how content is
//! fingerprinted for change detection.
//!
//! # Key Types
//!
//! - [`ObjectKey`]: Non-empty, `/`-separated destination key
//! - [`Entry`]: One directory or file discovered by the tree walk
//! - [`EntryKind`]: Directory or regular file
//! - [`Fingerprint`]: 128-bit MD5 content digest
//! - [`RemoteObjectState`]: Point-in-time read of a remote object's metadata

pub mod entry;
pub mod error;
pub mod fingerprint;
pub mod key;
pub mod remote;

pub use entry::{Entry, EntryKind};
pub use error::TypeError;
pub use fingerprint::Fingerprint;
pub use key::ObjectKey;
pub use remote::{RemoteObjectState, DIRECTORY_CONTENT_TYPE};
