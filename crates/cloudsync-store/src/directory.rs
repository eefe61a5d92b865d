//! On-disk object store.
//!
//! Layout under the store root:
//!
//! ```text
//! <root>/<container>/<name>.data   object body
//! <root>/<container>/<name>.json   metadata sidecar
//! ```
//!
//! `<name>` is the hex fingerprint of the object key, so keys that nest
//! (`a` and `a/b`) never collide on the host filesystem. Bodies and sidecars
//! are written to a temporary file in the container and renamed into place;
//! the body lands before the sidecar, so an interrupted upload leaves a
//! stale fingerprint behind and is re-uploaded by the next run.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use cloudsync_types::{Fingerprint, RemoteObjectState};

use crate::credentials::Credentials;
use crate::error::{StoreError, StoreResult};
use crate::traits::{Authenticator, ObjectStore};

/// Metadata persisted next to every object body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct ObjectMeta {
    key: String,
    content_type: Option<String>,
    fingerprint: Fingerprint,
    size: u64,
}

/// Copies everything read from `inner` into `sink`.
struct TeeReader<'a, R: ?Sized, W> {
    inner: &'a mut R,
    sink: &'a mut W,
    written: u64,
}

impl<R: Read + ?Sized, W: Write> Read for TeeReader<'_, R, W> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.sink.write_all(&buf[..n])?;
        self.written += n as u64;
        Ok(n)
    }
}

/// Object store persisted in a local directory.
///
/// Cloning is cheap; all clones address the same root. Concurrent writers
/// to distinct keys never interfere; concurrent writers to the same key
/// race at rename time and the last rename wins.
#[derive(Clone, Debug)]
pub struct DirectoryObjectStore {
    root: PathBuf,
}

impl DirectoryObjectStore {
    /// Address a store rooted at `root`. Nothing is touched on disk until
    /// the store is authenticated or a container is ensured.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Parse an endpoint of the form `file:///path` or a bare path.
    pub fn from_endpoint(endpoint: &str) -> Self {
        let path = endpoint.strip_prefix("file://").unwrap_or(endpoint);
        Self::new(path)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn container_dir(&self, container: &str) -> StoreResult<PathBuf> {
        let invalid = container.is_empty()
            || container == "."
            || container == ".."
            || container.contains(['/', '\\']);
        if invalid {
            return Err(StoreError::InvalidContainer(container.to_string()));
        }
        Ok(self.root.join(container))
    }

    fn existing_container_dir(&self, container: &str) -> StoreResult<PathBuf> {
        let dir = self.container_dir(container)?;
        if !dir.is_dir() {
            return Err(StoreError::ContainerNotFound(container.to_string()));
        }
        Ok(dir)
    }

    fn object_paths(dir: &Path, key: &str) -> (PathBuf, PathBuf) {
        let name = Fingerprint::from_bytes(key.as_bytes()).to_hex();
        (
            dir.join(format!("{name}.data")),
            dir.join(format!("{name}.json")),
        )
    }

    fn write_meta(dir: &Path, path: &Path, meta: &ObjectMeta) -> StoreResult<()> {
        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer(&mut tmp, meta)?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }

    fn read_meta(path: &Path) -> StoreResult<Option<ObjectMeta>> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Read an object's body back. Used by tooling and tests.
    pub fn read_object(&self, container: &str, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let dir = self.existing_container_dir(container)?;
        let (data_path, meta_path) = Self::object_paths(&dir, key);
        if Self::read_meta(&meta_path)?.is_none() {
            return Ok(None);
        }
        Ok(Some(fs::read(data_path)?))
    }
}

impl ObjectStore for DirectoryObjectStore {
    fn ensure_container(&self, container: &str) -> StoreResult<()> {
        let dir = self.container_dir(container)?;
        fs::create_dir_all(&dir)?;
        tracing::debug!(container, path = %dir.display(), "container ready");
        Ok(())
    }

    fn get_metadata(&self, container: &str, key: &str) -> StoreResult<RemoteObjectState> {
        let dir = self.existing_container_dir(container)?;
        let (_, meta_path) = Self::object_paths(&dir, key);
        Ok(match Self::read_meta(&meta_path)? {
            Some(meta) if meta.key == key => {
                RemoteObjectState::present(meta.content_type, Some(meta.fingerprint.to_hex()))
            }
            Some(meta) => {
                return Err(StoreError::Serialization(format!(
                    "sidecar for {key} names a different key: {}",
                    meta.key
                )))
            }
            None => RemoteObjectState::absent(),
        })
    }

    fn put_empty(&self, container: &str, key: &str, content_type: &str) -> StoreResult<()> {
        let dir = self.existing_container_dir(container)?;
        let (data_path, meta_path) = Self::object_paths(&dir, key);

        let tmp = NamedTempFile::new_in(&dir)?;
        tmp.persist(&data_path).map_err(|e| StoreError::Io(e.error))?;
        Self::write_meta(
            &dir,
            &meta_path,
            &ObjectMeta {
                key: key.to_string(),
                content_type: Some(content_type.to_string()),
                fingerprint: Fingerprint::from_bytes(&[]),
                size: 0,
            },
        )
    }

    fn put_stream(
        &self,
        container: &str,
        key: &str,
        body: &mut dyn Read,
        expected: &Fingerprint,
    ) -> StoreResult<()> {
        let dir = self.existing_container_dir(container)?;
        let (data_path, meta_path) = Self::object_paths(&dir, key);

        let mut tmp = NamedTempFile::new_in(&dir)?;
        let mut tee = TeeReader {
            inner: body,
            sink: tmp.as_file_mut(),
            written: 0,
        };
        let actual = Fingerprint::compute(&mut tee)?;
        let size = tee.written;

        if actual != *expected {
            return Err(StoreError::ChecksumMismatch {
                key: key.to_string(),
                expected: expected.to_hex(),
                actual: actual.to_hex(),
            });
        }

        tmp.as_file().sync_data()?;
        tmp.persist(&data_path).map_err(|e| StoreError::Io(e.error))?;
        Self::write_meta(
            &dir,
            &meta_path,
            &ObjectMeta {
                key: key.to_string(),
                content_type: None,
                fingerprint: actual,
                size,
            },
        )
    }
}

impl Authenticator for DirectoryObjectStore {
    fn authenticate(&self, credentials: &Credentials) -> StoreResult<Arc<dyn ObjectStore>> {
        if credentials.secret.is_empty() {
            return Err(StoreError::Unauthorized {
                tenant: credentials.tenant.clone(),
                username: credentials.username.clone(),
            });
        }
        fs::create_dir_all(&self.root)?;
        tracing::debug!(
            root = %self.root.display(),
            identity = %credentials.identity(),
            "opened directory store"
        );
        Ok(Arc::new(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudsync_types::DIRECTORY_CONTENT_TYPE;
    use std::io::Cursor;

    fn store() -> (tempfile::TempDir, DirectoryObjectStore) {
        let tmp = tempfile::tempdir().unwrap();
        let store = DirectoryObjectStore::new(tmp.path().join("objects"));
        fs::create_dir_all(store.root()).unwrap();
        store.ensure_container("bucket").unwrap();
        (tmp, store)
    }

    fn upload(store: &DirectoryObjectStore, key: &str, data: &[u8]) -> StoreResult<()> {
        store.put_stream(
            "bucket",
            key,
            &mut Cursor::new(data),
            &Fingerprint::from_bytes(data),
        )
    }

    #[test]
    fn upload_round_trips_body_and_fingerprint() {
        let (_tmp, store) = store();
        upload(&store, "docs/readme.md", b"# hi").unwrap();

        let state = store.get_metadata("bucket", "docs/readme.md").unwrap();
        assert!(state.exists);
        assert!(state.matches(&Fingerprint::from_bytes(b"# hi")));
        assert_eq!(
            store.read_object("bucket", "docs/readme.md").unwrap(),
            Some(b"# hi".to_vec())
        );
    }

    #[test]
    fn nested_keys_do_not_collide() {
        let (_tmp, store) = store();
        store
            .put_empty("bucket", "a", DIRECTORY_CONTENT_TYPE)
            .unwrap();
        upload(&store, "a/b", b"inner").unwrap();

        assert!(store.get_metadata("bucket", "a").unwrap().is_directory_marker());
        assert!(!store.get_metadata("bucket", "a/b").unwrap().is_directory_marker());
    }

    #[test]
    fn mismatched_fingerprint_leaves_no_object() {
        let (_tmp, store) = store();
        let wrong = Fingerprint::from_bytes(b"other");
        let err = store
            .put_stream("bucket", "k", &mut Cursor::new(b"data"), &wrong)
            .unwrap_err();
        assert!(matches!(err, StoreError::ChecksumMismatch { .. }));
        assert!(!store.get_metadata("bucket", "k").unwrap().exists);

        let leftovers = fs::read_dir(store.root().join("bucket")).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn missing_container_is_reported() {
        let (_tmp, store) = store();
        assert!(matches!(
            store.get_metadata("other", "k"),
            Err(StoreError::ContainerNotFound(_))
        ));
    }

    #[test]
    fn container_names_cannot_escape_root() {
        let (_tmp, store) = store();
        for bad in ["", ".", "..", "a/b", "a\\b"] {
            assert!(matches!(
                store.ensure_container(bad),
                Err(StoreError::InvalidContainer(_))
            ));
        }
    }

    #[test]
    fn state_persists_across_handles() {
        let (_tmp, store) = store();
        upload(&store, "k", b"persisted").unwrap();
        let reopened = DirectoryObjectStore::from_endpoint(&format!(
            "file://{}",
            store.root().display()
        ));
        assert!(reopened
            .get_metadata("bucket", "k")
            .unwrap()
            .matches(&Fingerprint::from_bytes(b"persisted")));
    }

    #[test]
    fn empty_secret_is_unauthorized() {
        let (_tmp, store) = store();
        let creds = Credentials::new("e", "t", "u", "");
        assert!(matches!(
            store.authenticate(&creds),
            Err(StoreError::Unauthorized { .. })
        ));
        assert!(store
            .authenticate(&Credentials::new("e", "t", "u", "pw"))
            .is_ok());
    }
}
