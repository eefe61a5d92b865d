//! Error types for the scan crate.

use std::path::PathBuf;

/// The local tree could not be fully observed.
///
/// Every variant is structural: a partial view of the tree would produce an
/// incomplete remote mirror, so callers abort the run instead of skipping.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The walk failed at some path (permission denied, vanished entry).
    #[error("cannot traverse {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// A path could not be inspected outside the walk itself.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The sync root exists but is not a directory.
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// A path has no UTF-8 form and cannot become an object key.
    #[error("path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),
}

/// Convenience alias for scan results.
pub type ScanResult<T> = Result<T, ScanError>;
