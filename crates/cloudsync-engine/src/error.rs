use std::io;
use std::path::PathBuf;

use cloudsync_scan::ScanError;
use cloudsync_store::StoreError;
use thiserror::Error;

use crate::report::SyncReport;

/// Why a single entry could not be synchronized.
///
/// Entry errors are collected, never thrown: siblings keep syncing.
#[derive(Debug, Error)]
pub enum EntryError {
    /// The file could not be read while computing its fingerprint.
    #[error("cannot fingerprint {}: {source}", path.display())]
    Fingerprint {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file could not be reopened for upload.
    #[error("cannot open {} for upload: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The backend failed or rejected the upload.
    #[error("upload failed: {0}")]
    Upload(#[source] StoreError),

    /// The directory marker could not be written.
    #[error("cannot write directory marker: {0}")]
    Marker(#[source] StoreError),
}

impl EntryError {
    /// Short machine-readable tag for progress output.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Fingerprint { .. } => "fingerprint",
            Self::Open { .. } => "open",
            Self::Upload(_) => "upload",
            Self::Marker(_) => "marker",
        }
    }
}

/// Errors that end a synchronization run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("authentication failed: {0}")]
    Auth(#[source] StoreError),

    #[error("cannot set up container {container}: {source}")]
    ContainerSetup {
        container: String,
        #[source]
        source: StoreError,
    },

    #[error("tree walk failed: {0}")]
    Traversal(#[from] ScanError),

    /// The run completed but some entries failed. The report lists every
    /// outcome, including the failures.
    #[error("{} of {} entries failed to sync", .0.failed(), .0.total())]
    EntriesFailed(SyncReport),
}

impl SyncError {
    /// `true` if the run stopped before processing any entry.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::EntriesFailed(_))
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
