//! Scanning a tree into the work the executor performs.

use std::path::{Path, PathBuf};

use cloudsync_types::{Entry, EntryKind, ObjectKey};
use tracing::info;

use crate::error::{ScanError, ScanResult};
use crate::fs::FileSystem;
use crate::mapper::PathMapper;

/// A file to fingerprint and, if changed, upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileEntry {
    pub local_path: PathBuf,
    pub key: ObjectKey,
}

/// Entries partitioned by kind, ready for the two executor phases.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncPlan {
    /// Directory markers to ensure: prefix ancestors first, then walked
    /// directories in walk order. Duplicates are kept.
    pub directories: Vec<ObjectKey>,
    pub files: Vec<FileEntry>,
}

impl SyncPlan {
    /// Walk `root` and map every entry below it.
    pub fn build(fs: &dyn FileSystem, root: &Path, prefix: Option<&str>) -> ScanResult<Self> {
        let entries = scan_entries(fs, root, prefix)?;
        Ok(Self::from_entries(entries))
    }

    /// Partition entries by kind, preserving their relative order.
    pub fn from_entries(entries: impl IntoIterator<Item = Entry>) -> Self {
        let mut plan = Self::default();
        for entry in entries {
            match entry.into_parts() {
                (key, _, EntryKind::Directory) => plan.directories.push(key),
                (key, Some(local_path), EntryKind::File) => {
                    plan.files.push(FileEntry { local_path, key })
                }
                (_, None, EntryKind::File) => unreachable!("file entries carry a local path"),
            }
        }
        plan
    }

    pub fn directory_count(&self) -> usize {
        self.directories.len()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directories.is_empty() && self.files.is_empty()
    }
}

/// Walk `root` and turn every directory and regular file below it into an
/// [`Entry`], preceded by one synthetic directory per prefix level.
///
/// The root itself never becomes an entry. Any walk failure aborts the scan.
pub fn scan_entries(
    fs: &dyn FileSystem,
    root: &Path,
    prefix: Option<&str>,
) -> ScanResult<Vec<Entry>> {
    let root = std::path::absolute(root).map_err(|source| ScanError::Io {
        path: root.to_path_buf(),
        source,
    })?;
    match fs.stat(&root) {
        Ok(EntryKind::Directory) => {}
        Ok(EntryKind::File) => return Err(ScanError::NotADirectory(root)),
        Err(source) => return Err(ScanError::Io { path: root, source }),
    }

    let mapper = PathMapper::new(&root, prefix);
    let mut entries: Vec<Entry> = mapper
        .prefix_directories()
        .iter()
        .cloned()
        .map(Entry::synthetic_directory)
        .collect();

    for scanned in fs.walk(&root) {
        let scanned = scanned?;
        let Some(key) = mapper.map(&scanned.path)? else {
            continue;
        };
        entries.push(match scanned.kind {
            EntryKind::Directory => Entry::directory(scanned.path, key),
            EntryKind::File => Entry::file(scanned.path, key),
        });
    }

    info!(
        root = %root.display(),
        prefix_levels = mapper.prefix_directories().len(),
        entries = entries.len(),
        "scan complete"
    );
    Ok(entries)
}
