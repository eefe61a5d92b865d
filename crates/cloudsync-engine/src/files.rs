//! File phase: fingerprint, compare, upload when changed.

use std::path::Path;

use cloudsync_scan::{FileEntry, FileSystem};
use cloudsync_types::{EntryKind, Fingerprint};
use tracing::{debug, warn};

use crate::error::EntryError;
use crate::executor::PhaseContext;
use crate::progress::{SyncEvent, SyncStatus};
use crate::report::{Decision, EntryOutcome, FailedEntry};

/// Stream the file at `path` through the digest.
pub(crate) fn fingerprint_file(fs: &dyn FileSystem, path: &Path) -> std::io::Result<Fingerprint> {
    let mut reader = fs.open(path)?;
    Fingerprint::compute(&mut reader)
}

/// Bring one remote object in line with its local file.
///
/// The remote metadata is always read fresh. An object is left alone only
/// when its stored digest equals the local one byte for byte; a missing
/// object, a different digest or a failed metadata read all lead to an
/// upload. The file is opened twice, once to hash and once to upload, so a
/// file modified in between is caught by the store's digest check.
pub(crate) fn sync_file(ctx: &PhaseContext<'_>, file: &FileEntry) -> EntryOutcome {
    let fail = |error: EntryError| {
        warn!(key = %file.key, path = %file.local_path.display(), %error, "file sync failed");
        let failed = FailedEntry {
            key: file.key.clone(),
            kind: EntryKind::File,
            local_path: Some(file.local_path.clone()),
            error,
        };
        ctx.sink.report(&SyncEvent::from(&failed));
        failed
    };

    let local = fingerprint_file(ctx.fs, &file.local_path).map_err(|source| {
        fail(EntryError::Fingerprint {
            path: file.local_path.clone(),
            source,
        })
    })?;

    match ctx.store.get_metadata(ctx.container, file.key.as_str()) {
        Ok(remote) if remote.matches(&local) => {
            debug!(key = %file.key, fingerprint = %local, "unchanged");
            return Ok(ctx.settle(&file.key, EntryKind::File, Decision::Unchanged));
        }
        Ok(remote) => {
            debug!(
                key = %file.key,
                exists = remote.exists,
                remote = ?remote.content_fingerprint,
                local = %local,
                "upload needed"
            );
        }
        Err(e) => {
            debug!(key = %file.key, error = %e, "metadata read failed; uploading");
        }
    }

    ctx.sink.report(&SyncEvent::new(
        file.key.clone(),
        EntryKind::File,
        SyncStatus::Started,
    ));

    let mut body = ctx.fs.open(&file.local_path).map_err(|source| {
        fail(EntryError::Open {
            path: file.local_path.clone(),
            source,
        })
    })?;

    ctx.store
        .put_stream(ctx.container, file.key.as_str(), &mut body, &local)
        .map_err(|e| fail(EntryError::Upload(e)))?;

    Ok(ctx.settle(&file.key, EntryKind::File, Decision::Uploaded))
}
