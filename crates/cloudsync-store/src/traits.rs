use std::io::Read;
use std::sync::Arc;

use cloudsync_types::{Fingerprint, RemoteObjectState};

use crate::credentials::Credentials;
use crate::error::StoreResult;

/// Authenticated session against a key-addressed object store.
///
/// All implementations must satisfy these invariants:
/// - Every method is safe to call concurrently from many threads; the sync
///   engine shares one session across its whole worker pool.
/// - Containers are flat namespaces: an object may be written before any
///   object for its parent key exists.
/// - `put_stream` verifies the received bytes against the expected
///   fingerprint and never leaves a mismatching object visible as success.
/// - All I/O errors are propagated, never silently ignored.
pub trait ObjectStore: Send + Sync {
    /// Create the container if it does not already exist.
    fn ensure_container(&self, container: &str) -> StoreResult<()>;

    /// Read an object's metadata.
    ///
    /// Returns a state with `exists == false` if the object does not exist.
    /// Returns `Err` only on backend faults.
    fn get_metadata(&self, container: &str, key: &str) -> StoreResult<RemoteObjectState>;

    /// Write a zero-length object tagged with `content_type`.
    fn put_empty(&self, container: &str, key: &str, content_type: &str) -> StoreResult<()>;

    /// Stream `body` to the object at `key`, replacing any existing object.
    fn put_stream(
        &self,
        container: &str,
        key: &str,
        body: &mut dyn Read,
        expected: &Fingerprint,
    ) -> StoreResult<()>;
}

/// Entry point to a backend: exchanges credentials for a session.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, credentials: &Credentials) -> StoreResult<Arc<dyn ObjectStore>>;
}
