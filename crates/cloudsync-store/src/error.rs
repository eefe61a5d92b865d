/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend rejected the supplied credentials.
    #[error("authentication failed for {username}@{tenant}")]
    Unauthorized { tenant: String, username: String },

    /// The identity string is not of the form `<tenant>:<username>`.
    #[error("invalid identity {0:?}: expected '<tenant>:<username>'")]
    InvalidIdentity(String),

    /// The container name cannot be used by this backend.
    #[error("invalid container name {0:?}")]
    InvalidContainer(String),

    /// The container does not exist (and was not created).
    #[error("container not found: {0}")]
    ContainerNotFound(String),

    /// Uploaded bytes do not hash to the fingerprint the client supplied.
    #[error("checksum mismatch for {key}: expected {expected}, received {actual}")]
    ChecksumMismatch {
        key: String,
        expected: String,
        actual: String,
    },

    /// The backend refused the write.
    #[error("write rejected for {key}: {reason}")]
    Rejected { key: String, reason: String },

    /// The request did not reach the backend or the response was lost.
    #[error("transport error: {0}")]
    Transport(String),

    /// Metadata could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
