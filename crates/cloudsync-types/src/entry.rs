//! Tree entries: the unit of work handed from the scanner to the executor.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::key::ObjectKey;

/// What a tree entry represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Directory,
    File,
}

impl EntryKind {
    pub fn is_directory(self) -> bool {
        matches!(self, Self::Directory)
    }
}

/// A single directory or file destined for the object store.
///
/// Every `File` entry carries the local path it was discovered at.
/// Directories synthesized from the destination prefix have no local path.
/// Entries are immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    local_path: Option<PathBuf>,
    object_key: ObjectKey,
    kind: EntryKind,
}

impl Entry {
    /// A directory that exists in the local tree.
    pub fn directory(local_path: impl Into<PathBuf>, object_key: ObjectKey) -> Self {
        Self {
            local_path: Some(local_path.into()),
            object_key,
            kind: EntryKind::Directory,
        }
    }

    /// A directory that only exists as an ancestor of the destination prefix.
    pub fn synthetic_directory(object_key: ObjectKey) -> Self {
        Self {
            local_path: None,
            object_key,
            kind: EntryKind::Directory,
        }
    }

    /// A regular file in the local tree.
    pub fn file(local_path: impl Into<PathBuf>, object_key: ObjectKey) -> Self {
        Self {
            local_path: Some(local_path.into()),
            object_key,
            kind: EntryKind::File,
        }
    }

    pub fn local_path(&self) -> Option<&Path> {
        self.local_path.as_deref()
    }

    pub fn object_key(&self) -> &ObjectKey {
        &self.object_key
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// `true` for prefix-ancestor directories with no local counterpart.
    pub fn is_synthetic(&self) -> bool {
        self.local_path.is_none()
    }

    /// Split the entry into its key and, for files, its local path.
    pub fn into_parts(self) -> (ObjectKey, Option<PathBuf>, EntryKind) {
        (self.object_key, self.local_path, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> ObjectKey {
        ObjectKey::new(s).unwrap()
    }

    #[test]
    fn file_entries_always_have_a_local_path() {
        let entry = Entry::file("/data/a.txt", key("a.txt"));
        assert_eq!(entry.kind(), EntryKind::File);
        assert_eq!(entry.local_path(), Some(Path::new("/data/a.txt")));
        assert!(!entry.is_synthetic());
    }

    #[test]
    fn synthetic_directories_have_no_local_path() {
        let entry = Entry::synthetic_directory(key("backup/2024"));
        assert!(entry.kind().is_directory());
        assert!(entry.is_synthetic());
        assert!(entry.local_path().is_none());
    }

    #[test]
    fn into_parts_preserves_fields() {
        let (k, path, kind) = Entry::directory("/data/sub", key("sub")).into_parts();
        assert_eq!(k.as_str(), "sub");
        assert_eq!(path, Some(PathBuf::from("/data/sub")));
        assert_eq!(kind, EntryKind::Directory);
    }
}
