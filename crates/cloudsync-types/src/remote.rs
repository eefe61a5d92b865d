use serde::{Deserialize, Serialize};

use crate::fingerprint::Fingerprint;

/// Content type that marks a zero-length object as a directory node.
pub const DIRECTORY_CONTENT_TYPE: &str = "application/directory";

/// A point-in-time read of one remote object's metadata.
///
/// Never cached: the executor fetches a fresh state for every decision and
/// tolerates whatever eventual consistency the backend exhibits.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteObjectState {
    pub exists: bool,
    pub content_type: Option<String>,
    /// Hex digest as reported by the backend (its ETag).
    pub content_fingerprint: Option<String>,
}

impl RemoteObjectState {
    /// State of an object that does not exist.
    pub fn absent() -> Self {
        Self::default()
    }

    /// State of an existing object.
    pub fn present(content_type: Option<String>, content_fingerprint: Option<String>) -> Self {
        Self {
            exists: true,
            content_type,
            content_fingerprint,
        }
    }

    /// `true` if the object exists and carries the directory marker type.
    pub fn is_directory_marker(&self) -> bool {
        self.exists && self.content_type.as_deref() == Some(DIRECTORY_CONTENT_TYPE)
    }

    /// Byte-exact comparison of the stored digest against `local`.
    ///
    /// A missing object, a missing digest, or a digest the backend reports
    /// in a form that does not decode never matches.
    pub fn matches(&self, local: &Fingerprint) -> bool {
        if !self.exists {
            return false;
        }
        self.content_fingerprint
            .as_deref()
            .map(|remote| remote.trim_matches('"'))
            .and_then(|remote| Fingerprint::from_hex(remote).ok())
            .is_some_and(|remote| remote == *local)
    }
}
