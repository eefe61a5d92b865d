//! Per-entry progress events.
//!
//! Every directory and file decision is reported to a [`ProgressSink`] as
//! soon as it is made, from whichever worker made it. Sinks must therefore
//! be thread-safe; the engine makes no ordering promise between entries.

use std::path::PathBuf;
use std::sync::Mutex;

use cloudsync_types::{EntryKind, ObjectKey};
use serde::Serialize;

/// Progress tag attached to an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// The remote object already matches; nothing was written.
    Unchanged,
    /// A directory marker was written.
    Created,
    /// An upload is about to begin. Informational, never final.
    Started,
    /// A file was uploaded.
    Uploaded,
    /// The entry failed; the event carries the cause.
    Failed,
}

impl SyncStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::Created => "created",
            Self::Started => "started",
            Self::Uploaded => "uploaded",
            Self::Failed => "failed",
        }
    }

    /// `true` for the tags that settle an entry.
    pub fn is_final(self) -> bool {
        !matches!(self, Self::Started)
    }
}

/// One progress event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SyncEvent {
    pub key: ObjectKey,
    pub kind: EntryKind,
    pub status: SyncStatus,
    /// Local file behind a failed entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncEvent {
    pub fn new(key: ObjectKey, kind: EntryKind, status: SyncStatus) -> Self {
        Self {
            key,
            kind,
            status,
            local_path: None,
            error: None,
        }
    }

    pub fn failed(key: ObjectKey, kind: EntryKind, error: impl ToString) -> Self {
        Self {
            key,
            kind,
            status: SyncStatus::Failed,
            local_path: None,
            error: Some(error.to_string()),
        }
    }

    pub fn with_local_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_path = Some(path.into());
        self
    }
}

/// Receiver of progress events.
pub trait ProgressSink: Send + Sync {
    /// Called once per run, after authentication and container setup
    /// succeeded and before the tree is scanned.
    fn container_ready(&self, _container: &str) {}

    fn report(&self, event: &SyncEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(&SyncEvent) + Send + Sync,
{
    fn report(&self, event: &SyncEvent) {
        self(event)
    }
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn report(&self, _event: &SyncEvent) {}
}

/// Keeps every event in arrival order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    ready: Mutex<Vec<String>>,
    events: Mutex<Vec<SyncEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Containers announced through [`ProgressSink::container_ready`].
    pub fn ready_containers(&self) -> Vec<String> {
        self.ready.lock().expect("lock poisoned").clone()
    }

    /// All events received so far.
    pub fn events(&self) -> Vec<SyncEvent> {
        self.events.lock().expect("lock poisoned").clone()
    }

    /// Number of events carrying `status`.
    pub fn count(&self, status: SyncStatus) -> usize {
        self.events
            .lock()
            .expect("lock poisoned")
            .iter()
            .filter(|e| e.status == status)
            .count()
    }

    /// Final events only, i.e. without `Started`.
    pub fn decisions(&self) -> Vec<SyncEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.status.is_final())
            .collect()
    }
}

impl ProgressSink for RecordingSink {
    fn container_ready(&self, container: &str) {
        self.ready
            .lock()
            .expect("lock poisoned")
            .push(container.to_string());
    }

    fn report(&self, event: &SyncEvent) {
        self.events
            .lock()
            .expect("lock poisoned")
            .push(event.clone());
    }
}
