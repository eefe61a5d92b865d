use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};

/// Number of file workers when none is configured.
pub const DEFAULT_WORKERS: usize = 4;

/// What to synchronize into, and how wide to run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Destination container (bucket).
    pub container: String,
    /// Key prefix placed in front of every object; each of its levels is
    /// materialized as a directory marker.
    pub prefix: Option<String>,
    /// Size of the worker pool.
    pub workers: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            container: String::new(),
            prefix: None,
            workers: DEFAULT_WORKERS,
        }
    }
}

impl SyncConfig {
    /// A configuration for `container` with default settings otherwise.
    pub fn new(container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            ..Default::default()
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> SyncResult<()> {
        if self.container.is_empty() {
            return Err(SyncError::Config("container must not be empty".into()));
        }
        if self.workers == 0 {
            return Err(SyncError::Config("worker count must be at least 1".into()));
        }
        Ok(())
    }
}
