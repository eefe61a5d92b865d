//! Object storage capabilities for cloudsync.
//!
//! The sync engine never speaks a storage protocol itself. It consumes two
//! capabilities defined here:
//!
//! - [`Authenticator`] -- exchanges [`Credentials`] for a session
//! - [`ObjectStore`] -- the session: container setup, metadata reads,
//!   marker writes and streamed uploads
//!
//! # Backends
//!
//! - [`InMemoryObjectStore`] -- `HashMap`-based store with call counters,
//!   in-flight gauges and fault injection, for tests and embedding
//! - [`DirectoryObjectStore`] -- persistent store under a local directory
//!
//! # Design Rules
//!
//! 1. Sessions are shared by every worker and must tolerate concurrent calls.
//! 2. A missing object is a normal answer (`exists == false`), not an error.
//! 3. Uploads carry the client's fingerprint and are verified server-side.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod credentials;
pub mod directory;
pub mod error;
pub mod memory;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use credentials::Credentials;
pub use directory::DirectoryObjectStore;
pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryObjectStore, StoreStats};
pub use traits::{Authenticator, ObjectStore};
