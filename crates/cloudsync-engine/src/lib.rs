//! # cloudsync-engine
//!
//! Mirrors a local directory tree into an object-storage container.
//!
//! A run authenticates, makes sure the destination container exists, scans
//! the tree into a [`SyncPlan`], then executes the plan in two phases on a
//! fixed-size worker pool:
//!
//! 1. every directory (and every level of the key prefix) is materialized
//!    as a zero-length marker object;
//! 2. every regular file is fingerprinted and uploaded only when the
//!    remote digest differs.
//!
//! Entry failures are collected into a [`SyncReport`] and never stop
//! sibling entries. Configuration, authentication, container and walk
//! failures abort the run before any entry is processed.

pub mod config;
pub mod error;
pub mod executor;
pub mod pool;
pub mod progress;
pub mod report;

mod directories;
mod files;

use std::path::Path;
use std::sync::Arc;

use cloudsync_scan::{FileSystem, SyncPlan};
use cloudsync_store::{Authenticator, Credentials};
use tracing::info;

pub use config::{SyncConfig, DEFAULT_WORKERS};
pub use error::{EntryError, SyncError, SyncResult};
pub use executor::SyncExecutor;
pub use pool::WorkerPool;
pub use progress::{NullSink, ProgressSink, RecordingSink, SyncEvent, SyncStatus};
pub use report::{CompletedEntry, Decision, EntryOutcome, FailedEntry, SyncReport};

/// Synchronize the tree at `root` into the configured container.
///
/// Returns the full report when every entry succeeded and
/// [`SyncError::EntriesFailed`] carrying the same report otherwise.
pub fn sync_tree(
    authenticator: &dyn Authenticator,
    credentials: &Credentials,
    fs: Arc<dyn FileSystem>,
    root: &Path,
    config: &SyncConfig,
    sink: &dyn ProgressSink,
) -> SyncResult<SyncReport> {
    config.validate()?;

    let store = authenticator
        .authenticate(credentials)
        .map_err(SyncError::Auth)?;
    info!(identity = %credentials.identity(), "authenticated");

    store
        .ensure_container(&config.container)
        .map_err(|source| SyncError::ContainerSetup {
            container: config.container.clone(),
            source,
        })?;
    sink.container_ready(&config.container);

    let plan = SyncPlan::build(fs.as_ref(), root, config.prefix.as_deref())?;
    info!(
        container = %config.container,
        directories = plan.directory_count(),
        files = plan.file_count(),
        "plan built"
    );

    SyncExecutor::from_config(store, fs, config)
        .execute(&plan, sink)
        .into_result()
}
