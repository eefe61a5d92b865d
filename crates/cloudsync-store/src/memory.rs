use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use cloudsync_types::{Fingerprint, RemoteObjectState};

use crate::credentials::Credentials;
use crate::error::{StoreError, StoreResult};
use crate::traits::{Authenticator, ObjectStore};

#[derive(Clone, Debug)]
struct MemoryObject {
    content_type: Option<String>,
    fingerprint: Fingerprint,
    data: Vec<u8>,
}

#[derive(Default)]
struct Faults {
    metadata: HashSet<String>,
    uploads: HashSet<String>,
}

#[derive(Default)]
struct Counters {
    metadata_calls: AtomicUsize,
    put_empty_calls: AtomicUsize,
    put_stream_calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

struct Shared {
    containers: RwLock<HashMap<String, HashMap<String, MemoryObject>>>,
    required: Option<Credentials>,
    latency: Duration,
    faults: RwLock<Faults>,
    counters: Counters,
}

/// Snapshot of the call counters of an [`InMemoryObjectStore`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub metadata_calls: usize,
    pub put_empty_calls: usize,
    pub put_stream_calls: usize,
    /// Highest number of calls observed executing at the same time.
    pub peak_in_flight: usize,
}

impl StoreStats {
    /// Total number of writes (markers and uploads).
    pub fn writes(&self) -> usize {
        self.put_empty_calls + self.put_stream_calls
    }
}

/// Decrements the in-flight gauge when a call finishes, however it finishes.
struct InFlight<'a>(&'a Counters);

impl<'a> InFlight<'a> {
    fn enter(counters: &'a Counters) -> Self {
        let now = counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        counters.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(counters)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-memory, HashMap-based object store.
///
/// Intended for tests and embedding. Cloning the store yields another handle
/// onto the same objects, so a test can hand one clone to the engine and
/// inspect the other. Besides storage it records per-operation call counts
/// and the peak number of concurrently executing calls, and it can be told
/// to fail specific keys.
#[derive(Clone)]
pub struct InMemoryObjectStore {
    shared: Arc<Shared>,
}

impl InMemoryObjectStore {
    /// Create a new empty store that accepts any credentials.
    pub fn new() -> Self {
        Self::build(None, Duration::ZERO)
    }

    /// Create a store that only authenticates the given credentials.
    pub fn with_credentials(credentials: Credentials) -> Self {
        Self::build(Some(credentials), Duration::ZERO)
    }

    /// Create a store whose every call sleeps for `latency` before returning.
    ///
    /// Used to make overlapping calls observable in concurrency tests.
    pub fn with_latency(latency: Duration) -> Self {
        Self::build(None, latency)
    }

    fn build(required: Option<Credentials>, latency: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                containers: RwLock::new(HashMap::new()),
                required,
                latency,
                faults: RwLock::new(Faults::default()),
                counters: Counters::default(),
            }),
        }
    }

    /// Make every metadata read of `key` fail with a transport error.
    pub fn fail_metadata_for(&self, key: impl Into<String>) {
        let mut faults = self.shared.faults.write().expect("lock poisoned");
        faults.metadata.insert(key.into());
    }

    /// Make every write to `key` be rejected.
    pub fn fail_uploads_for(&self, key: impl Into<String>) {
        let mut faults = self.shared.faults.write().expect("lock poisoned");
        faults.uploads.insert(key.into());
    }

    /// Remove all injected faults.
    pub fn clear_faults(&self) {
        let mut faults = self.shared.faults.write().expect("lock poisoned");
        *faults = Faults::default();
    }

    /// Store an object directly, bypassing counters and checksum checks.
    ///
    /// Lets tests seed state such as a truncated upload left by a killed run.
    pub fn insert_raw(
        &self,
        container: &str,
        key: &str,
        content_type: Option<&str>,
        data: &[u8],
        fingerprint: Fingerprint,
    ) {
        let mut map = self.shared.containers.write().expect("lock poisoned");
        map.entry(container.to_string()).or_default().insert(
            key.to_string(),
            MemoryObject {
                content_type: content_type.map(str::to_string),
                fingerprint,
                data: data.to_vec(),
            },
        );
    }

    /// `true` if the container has been created.
    pub fn has_container(&self, container: &str) -> bool {
        let map = self.shared.containers.read().expect("lock poisoned");
        map.contains_key(container)
    }

    /// Body of an object, if present.
    pub fn data(&self, container: &str, key: &str) -> Option<Vec<u8>> {
        self.with_object(container, key, |obj| obj.data.clone())
    }

    /// Content type of an object, if present.
    pub fn content_type(&self, container: &str, key: &str) -> Option<String> {
        self.with_object(container, key, |obj| obj.content_type.clone())
            .flatten()
    }

    /// Stored fingerprint of an object, if present.
    pub fn fingerprint(&self, container: &str, key: &str) -> Option<Fingerprint> {
        self.with_object(container, key, |obj| obj.fingerprint)
    }

    /// Sorted list of all keys in a container.
    pub fn keys(&self, container: &str) -> Vec<String> {
        let map = self.shared.containers.read().expect("lock poisoned");
        let mut keys: Vec<String> = map
            .get(container)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    /// Number of objects in a container.
    pub fn len(&self, container: &str) -> usize {
        let map = self.shared.containers.read().expect("lock poisoned");
        map.get(container).map_or(0, HashMap::len)
    }

    /// Returns `true` if the container holds no objects.
    pub fn is_empty(&self, container: &str) -> bool {
        self.len(container) == 0
    }

    /// Snapshot of the call counters.
    pub fn stats(&self) -> StoreStats {
        let c = &self.shared.counters;
        StoreStats {
            metadata_calls: c.metadata_calls.load(Ordering::SeqCst),
            put_empty_calls: c.put_empty_calls.load(Ordering::SeqCst),
            put_stream_calls: c.put_stream_calls.load(Ordering::SeqCst),
            peak_in_flight: c.peak_in_flight.load(Ordering::SeqCst),
        }
    }

    /// Zero all call counters.
    pub fn reset_stats(&self) {
        let c = &self.shared.counters;
        c.metadata_calls.store(0, Ordering::SeqCst);
        c.put_empty_calls.store(0, Ordering::SeqCst);
        c.put_stream_calls.store(0, Ordering::SeqCst);
        c.peak_in_flight.store(0, Ordering::SeqCst);
    }

    fn with_object<T>(
        &self,
        container: &str,
        key: &str,
        f: impl FnOnce(&MemoryObject) -> T,
    ) -> Option<T> {
        let map = self.shared.containers.read().expect("lock poisoned");
        map.get(container).and_then(|objects| objects.get(key)).map(f)
    }

    fn simulate_latency(&self) {
        if !self.shared.latency.is_zero() {
            std::thread::sleep(self.shared.latency);
        }
    }

    fn check_upload_fault(&self, key: &str) -> StoreResult<()> {
        let faults = self.shared.faults.read().expect("lock poisoned");
        if faults.uploads.contains(key) {
            return Err(StoreError::Rejected {
                key: key.to_string(),
                reason: "injected upload fault".into(),
            });
        }
        Ok(())
    }

    fn store(&self, container: &str, key: &str, object: MemoryObject) -> StoreResult<()> {
        let mut map = self.shared.containers.write().expect("lock poisoned");
        let objects = map
            .get_mut(container)
            .ok_or_else(|| StoreError::ContainerNotFound(container.to_string()))?;
        objects.insert(key.to_string(), object);
        Ok(())
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn ensure_container(&self, container: &str) -> StoreResult<()> {
        let mut map = self.shared.containers.write().expect("lock poisoned");
        map.entry(container.to_string()).or_default();
        Ok(())
    }

    fn get_metadata(&self, container: &str, key: &str) -> StoreResult<RemoteObjectState> {
        let _guard = InFlight::enter(&self.shared.counters);
        self.shared
            .counters
            .metadata_calls
            .fetch_add(1, Ordering::SeqCst);
        self.simulate_latency();

        {
            let faults = self.shared.faults.read().expect("lock poisoned");
            if faults.metadata.contains(key) {
                return Err(StoreError::Transport(format!(
                    "injected metadata fault for {key}"
                )));
            }
        }

        let map = self.shared.containers.read().expect("lock poisoned");
        let objects = map
            .get(container)
            .ok_or_else(|| StoreError::ContainerNotFound(container.to_string()))?;
        Ok(match objects.get(key) {
            Some(obj) => RemoteObjectState::present(
                obj.content_type.clone(),
                Some(obj.fingerprint.to_hex()),
            ),
            None => RemoteObjectState::absent(),
        })
    }

    fn put_empty(&self, container: &str, key: &str, content_type: &str) -> StoreResult<()> {
        let _guard = InFlight::enter(&self.shared.counters);
        self.shared
            .counters
            .put_empty_calls
            .fetch_add(1, Ordering::SeqCst);
        self.simulate_latency();
        self.check_upload_fault(key)?;

        self.store(
            container,
            key,
            MemoryObject {
                content_type: Some(content_type.to_string()),
                fingerprint: Fingerprint::from_bytes(&[]),
                data: Vec::new(),
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
        let _guard = InFlight::enter(&self.shared.counters);
        self.shared
            .counters
            .put_stream_calls
            .fetch_add(1, Ordering::SeqCst);
        self.simulate_latency();
        self.check_upload_fault(key)?;

        let mut data = Vec::new();
        body.read_to_end(&mut data)?;
        let actual = Fingerprint::from_bytes(&data);
        if actual != *expected {
            return Err(StoreError::ChecksumMismatch {
                key: key.to_string(),
                expected: expected.to_hex(),
                actual: actual.to_hex(),
            });
        }

        self.store(
            container,
            key,
            MemoryObject {
                content_type: None,
                fingerprint: actual,
                data,
            },
        )
    }
}

impl Authenticator for InMemoryObjectStore {
    fn authenticate(&self, credentials: &Credentials) -> StoreResult<Arc<dyn ObjectStore>> {
        if let Some(required) = &self.shared.required {
            if required != credentials {
                return Err(StoreError::Unauthorized {
                    tenant: credentials.tenant.clone(),
                    username: credentials.username.clone(),
                });
            }
        }
        Ok(Arc::new(self.clone()))
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let containers = self.shared.containers.read().expect("lock poisoned").len();
        f.debug_struct("InMemoryObjectStore")
            .field("containers", &containers)
            .field("stats", &self.stats())
            .finish()
    }
}
