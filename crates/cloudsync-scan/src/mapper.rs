//! Mapping local paths to object keys.
//!
//! A key is the path relative to the sync root, with `/` separators,
//! optionally below a destination prefix. The root itself maps to no key.

use std::path::{Component, Path, PathBuf};

use cloudsync_types::ObjectKey;

use crate::error::{ScanError, ScanResult};

/// Derives object keys for paths below a fixed root.
#[derive(Clone, Debug)]
pub struct PathMapper {
    root: PathBuf,
    prefix: Option<ObjectKey>,
    prefix_directories: Vec<ObjectKey>,
}

impl PathMapper {
    /// Build a mapper for `root` with an optional destination prefix.
    ///
    /// The prefix may use `/` or the host separator; empty segments (leading,
    /// trailing or doubled separators) are dropped. A prefix with no segments
    /// left is the same as no prefix.
    pub fn new(root: impl Into<PathBuf>, prefix: Option<&str>) -> Self {
        let segments: Vec<&str> = prefix
            .unwrap_or_default()
            .split(|c: char| c == '/' || c == std::path::MAIN_SEPARATOR)
            .filter(|s| !s.is_empty())
            .collect();

        let prefix_directories: Vec<ObjectKey> = (1..=segments.len())
            .filter_map(|depth| ObjectKey::new(segments[..depth].join("/")).ok())
            .collect();

        Self {
            root: root.into(),
            prefix: prefix_directories.last().cloned(),
            prefix_directories,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The normalized destination prefix, if any.
    pub fn prefix(&self) -> Option<&ObjectKey> {
        self.prefix.as_ref()
    }

    /// Every ancestor level of the prefix, shallowest first:
    /// `a/b/c` yields `a`, `a/b`, `a/b/c`.
    pub fn prefix_directories(&self) -> &[ObjectKey] {
        &self.prefix_directories
    }

    /// The `/`-separated path of `path` relative to the root.
    ///
    /// Returns `Ok(None)` for the root itself and for paths outside it.
    pub fn relative_key(&self, path: &Path) -> ScanResult<Option<String>> {
        let Ok(relative) = path.strip_prefix(&self.root) else {
            return Ok(None);
        };

        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(name) => {
                    let name = name
                        .to_str()
                        .ok_or_else(|| ScanError::NonUtf8Path(path.to_path_buf()))?;
                    segments.push(name);
                }
                Component::CurDir => {}
                _ => return Ok(None),
            }
        }

        if segments.is_empty() {
            return Ok(None);
        }
        Ok(Some(segments.join("/")))
    }

    /// The destination key of `path`, including the prefix.
    pub fn map(&self, path: &Path) -> ScanResult<Option<ObjectKey>> {
        let Some(relative) = self.relative_key(path)? else {
            return Ok(None);
        };
        Ok(match &self.prefix {
            Some(prefix) => Some(prefix.join(&relative)),
            None => ObjectKey::new(relative).ok(),
        })
    }
}
