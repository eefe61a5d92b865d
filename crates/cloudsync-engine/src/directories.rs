//! Directory phase: make sure every directory key exists as a marker object.

use cloudsync_types::{EntryKind, ObjectKey, DIRECTORY_CONTENT_TYPE};
use tracing::{debug, warn};

use crate::error::EntryError;
use crate::executor::PhaseContext;
use crate::progress::SyncEvent;
use crate::report::{Decision, EntryOutcome, FailedEntry};

/// Ensure `key` exists as a directory marker.
///
/// An existing object already tagged as a marker is left alone. Anything
/// else, including a failed metadata read, leads to an empty marker write.
/// Markers never depend on each other, so callers may run this for any
/// number of keys at once.
pub(crate) fn ensure_marker(ctx: &PhaseContext<'_>, key: &ObjectKey) -> EntryOutcome {
    match ctx.store.get_metadata(ctx.container, key.as_str()) {
        Ok(state) if state.is_directory_marker() => {
            debug!(%key, "directory marker present");
            return Ok(ctx.settle(key, EntryKind::Directory, Decision::Unchanged));
        }
        Ok(state) => {
            debug!(
                %key,
                exists = state.exists,
                content_type = ?state.content_type,
                "directory marker missing"
            );
        }
        Err(e) => {
            debug!(%key, error = %e, "metadata read failed; writing marker");
        }
    }

    match ctx
        .store
        .put_empty(ctx.container, key.as_str(), DIRECTORY_CONTENT_TYPE)
    {
        Ok(()) => Ok(ctx.settle(key, EntryKind::Directory, Decision::Created)),
        Err(e) => {
            let error = EntryError::Marker(e);
            warn!(%key, %error, "directory marker failed");
            let failed = FailedEntry {
                key: key.clone(),
                kind: EntryKind::Directory,
                local_path: None,
                error,
            };
            ctx.sink.report(&SyncEvent::from(&failed));
            Err(failed)
        }
    }
}
