//! The `FileSystem` capability and its local implementation.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use cloudsync_types::EntryKind;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{ScanError, ScanResult};

/// One path produced by a tree walk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScannedPath {
    pub path: PathBuf,
    pub kind: EntryKind,
}

/// Read access to a local tree.
///
/// Implementations are shared by every sync worker and must be safe to use
/// concurrently.
pub trait FileSystem: Send + Sync {
    /// Walk `root` depth-first, yielding the root itself, every directory and
    /// every regular file below it. Symlinks and special files are never
    /// yielded. The first unreadable path yields an `Err`.
    fn walk(&self, root: &Path) -> Box<dyn Iterator<Item = ScanResult<ScannedPath>>>;

    /// Open a file for streaming reads.
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>>;

    /// Classify a path. A symlink is classified by its target, so a sync
    /// root may itself be a link to a directory.
    fn stat(&self, path: &Path) -> io::Result<EntryKind>;
}

/// [`FileSystem`] over the host's real filesystem.
///
/// Walks in lexicographic file-name order with parents before children, so
/// progress output is reproducible across runs.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for LocalFileSystem {
    fn walk(&self, root: &Path) -> Box<dyn Iterator<Item = ScanResult<ScannedPath>>> {
        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        Box::new(walker.filter_map(|item| {
            let entry = match item {
                Ok(entry) => entry,
                Err(source) => {
                    let path = source.path().map(Path::to_path_buf).unwrap_or_default();
                    return Some(Err(ScanError::Walk { path, source }));
                }
            };
            let file_type = entry.file_type();
            let kind = if file_type.is_dir() {
                EntryKind::Directory
            } else if file_type.is_file() {
                EntryKind::File
            } else {
                debug!(path = %entry.path().display(), "skipping symlink or special file");
                return None;
            };
            Some(Ok(ScannedPath {
                path: entry.into_path(),
                kind,
            }))
        }))
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(File::open(path)?))
    }

    fn stat(&self, path: &Path) -> io::Result<EntryKind> {
        let file_type = std::fs::metadata(path)?.file_type();
        if file_type.is_dir() {
            Ok(EntryKind::Directory)
        } else if file_type.is_file() {
            Ok(EntryKind::File)
        } else {
            Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is neither a directory nor a regular file", path.display()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn walk_all(root: &Path) -> Vec<ScannedPath> {
        LocalFileSystem
            .walk(root)
            .collect::<ScanResult<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn walk_yields_root_dirs_and_files_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("b/inner")).unwrap();
        fs::write(root.join("a.txt"), b"a").unwrap();
        fs::write(root.join("b/inner/c.txt"), b"c").unwrap();

        let walked: Vec<(PathBuf, EntryKind)> = walk_all(root)
            .into_iter()
            .map(|s| (s.path.strip_prefix(root).unwrap().to_path_buf(), s.kind))
            .collect();

        assert_eq!(
            walked,
            vec![
                (PathBuf::new(), EntryKind::Directory),
                (PathBuf::from("a.txt"), EntryKind::File),
                (PathBuf::from("b"), EntryKind::Directory),
                (PathBuf::from("b/inner"), EntryKind::Directory),
                (PathBuf::from("b/inner/c.txt"), EntryKind::File),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn walk_skips_symlinks() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::write(root.join("real.txt"), b"r").unwrap();
        std::os::unix::fs::symlink(root.join("real.txt"), root.join("link.txt")).unwrap();
        std::os::unix::fs::symlink(root, root.join("loop")).unwrap();

        let names: Vec<PathBuf> = walk_all(root)
            .into_iter()
            .map(|s| s.path.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        assert_eq!(names, vec![PathBuf::new(), PathBuf::from("real.txt")]);
    }

    #[test]
    fn walk_of_missing_root_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing");
        let first = LocalFileSystem.walk(&missing).next().unwrap();
        assert!(matches!(first, Err(ScanError::Walk { .. })));
    }

    #[test]
    fn stat_classifies_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("f");
        fs::write(&file, b"x").unwrap();
        assert_eq!(LocalFileSystem.stat(tmp.path()).unwrap(), EntryKind::Directory);
        assert_eq!(LocalFileSystem.stat(&file).unwrap(), EntryKind::File);
        assert!(LocalFileSystem.stat(&tmp.path().join("nope")).is_err());
    }

    #[test]
    fn open_streams_content() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("f");
        fs::write(&file, b"stream me").unwrap();
        let mut buf = String::new();
        LocalFileSystem
            .open(&file)
            .unwrap()
            .read_to_string(&mut buf)
            .unwrap();
        assert_eq!(buf, "stream me");
    }
}
