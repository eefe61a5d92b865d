//! Two-phase execution of a [`SyncPlan`].
//!
//! Phase one ensures every directory marker, phase two fingerprints and
//! uploads every file. Both phases run on the same [`WorkerPool`] and the
//! file phase starts only after every directory worker has finished.

use std::sync::Arc;

use cloudsync_scan::{FileSystem, SyncPlan};
use cloudsync_store::ObjectStore;
use cloudsync_types::{EntryKind, ObjectKey};
use tracing::info;

use crate::config::SyncConfig;
use crate::directories::ensure_marker;
use crate::files::sync_file;
use crate::pool::WorkerPool;
use crate::progress::{ProgressSink, SyncEvent};
use crate::report::{CompletedEntry, Decision, SyncReport};

/// Everything a worker needs to settle one entry.
pub(crate) struct PhaseContext<'a> {
    pub store: &'a dyn ObjectStore,
    pub fs: &'a dyn FileSystem,
    pub container: &'a str,
    pub sink: &'a dyn ProgressSink,
}

impl<'a> PhaseContext<'a> {
    pub(crate) fn new(
        store: &'a dyn ObjectStore,
        fs: &'a dyn FileSystem,
        container: &'a str,
        sink: &'a dyn ProgressSink,
    ) -> Self {
        Self {
            store,
            fs,
            container,
            sink,
        }
    }

    /// Report a successful decision and turn it into a report row.
    pub(crate) fn settle(
        &self,
        key: &ObjectKey,
        kind: EntryKind,
        decision: Decision,
    ) -> CompletedEntry {
        self.sink
            .report(&SyncEvent::new(key.clone(), kind, decision.into()));
        CompletedEntry {
            key: key.clone(),
            kind,
            decision,
        }
    }
}

/// Runs sync plans against one authenticated store session.
pub struct SyncExecutor {
    store: Arc<dyn ObjectStore>,
    fs: Arc<dyn FileSystem>,
    container: String,
    pool: WorkerPool,
}

impl SyncExecutor {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        fs: Arc<dyn FileSystem>,
        container: impl Into<String>,
        workers: usize,
    ) -> Self {
        Self {
            store,
            fs,
            container: container.into(),
            pool: WorkerPool::new(workers),
        }
    }

    pub fn from_config(
        store: Arc<dyn ObjectStore>,
        fs: Arc<dyn FileSystem>,
        config: &SyncConfig,
    ) -> Self {
        Self::new(store, fs, config.container.clone(), config.workers)
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn workers(&self) -> usize {
        self.pool.workers()
    }

    /// Run both phases and report every decision.
    ///
    /// Entry failures never stop the run; they are collected in the
    /// returned report.
    pub fn execute(&self, plan: &SyncPlan, sink: &dyn ProgressSink) -> SyncReport {
        let ctx = PhaseContext::new(
            self.store.as_ref(),
            self.fs.as_ref(),
            &self.container,
            sink,
        );

        info!(
            container = %self.container,
            directories = plan.directory_count(),
            workers = self.pool.workers(),
            "directory phase"
        );
        let mut outcomes = self
            .pool
            .run(plan.directories.iter(), |key| ensure_marker(&ctx, key));

        info!(
            container = %self.container,
            files = plan.file_count(),
            workers = self.pool.workers(),
            "file phase"
        );
        outcomes.extend(self.pool.run(plan.files.iter(), |file| sync_file(&ctx, file)));

        let report = SyncReport::from_outcomes(outcomes);
        info!(
            unchanged = report.unchanged(),
            created = report.created(),
            uploaded = report.uploaded(),
            failed = report.failed(),
            "sync finished"
        );
        report
    }
}
