use std::fmt;
use std::path::PathBuf;

use cloudsync_types::{EntryKind, ObjectKey};
use serde::Serialize;

use crate::error::{EntryError, SyncError, SyncResult};
use crate::progress::{SyncEvent, SyncStatus};

/// Successful decision for one entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Unchanged,
    Created,
    Uploaded,
}

impl From<Decision> for SyncStatus {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Unchanged => SyncStatus::Unchanged,
            Decision::Created => SyncStatus::Created,
            Decision::Uploaded => SyncStatus::Uploaded,
        }
    }
}

/// An entry that was synchronized.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CompletedEntry {
    pub key: ObjectKey,
    pub kind: EntryKind,
    pub decision: Decision,
}

/// An entry that failed, with its cause.
#[derive(Debug)]
pub struct FailedEntry {
    pub key: ObjectKey,
    pub kind: EntryKind,
    pub local_path: Option<PathBuf>,
    pub error: EntryError,
}

impl fmt::Display for FailedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.local_path {
            Some(path) => write!(f, "{} ({}): {}", self.key, path.display(), self.error),
            None => write!(f, "{}: {}", self.key, self.error),
        }
    }
}

impl From<&FailedEntry> for SyncEvent {
    fn from(failed: &FailedEntry) -> Self {
        let event = SyncEvent::failed(failed.key.clone(), failed.kind, &failed.error);
        match &failed.local_path {
            Some(path) => event.with_local_path(path.clone()),
            None => event,
        }
    }
}

/// What one worker produced for one entry.
pub type EntryOutcome = Result<CompletedEntry, FailedEntry>;

/// Aggregate result of a run.
///
/// Completed entries and failures are each sorted by key so the report is
/// stable regardless of which worker finished first.
#[derive(Debug, Default)]
pub struct SyncReport {
    completed: Vec<CompletedEntry>,
    failures: Vec<FailedEntry>,
}

impl SyncReport {
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = EntryOutcome>) -> Self {
        let mut report = Self::default();
        for outcome in outcomes {
            match outcome {
                Ok(done) => report.completed.push(done),
                Err(failed) => report.failures.push(failed),
            }
        }
        report.completed.sort_by(|a, b| a.key.cmp(&b.key));
        report.failures.sort_by(|a, b| a.key.cmp(&b.key));
        report
    }

    pub fn completed(&self) -> &[CompletedEntry] {
        &self.completed
    }

    pub fn failures(&self) -> &[FailedEntry] {
        &self.failures
    }

    fn count(&self, decision: Decision) -> usize {
        self.completed
            .iter()
            .filter(|c| c.decision == decision)
            .count()
    }

    pub fn unchanged(&self) -> usize {
        self.count(Decision::Unchanged)
    }

    pub fn created(&self) -> usize {
        self.count(Decision::Created)
    }

    pub fn uploaded(&self) -> usize {
        self.count(Decision::Uploaded)
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Number of decisions made, successful or not.
    pub fn total(&self) -> usize {
        self.completed.len() + self.failures.len()
    }

    /// Decisions made for entries of `kind`.
    pub fn decisions_for(&self, kind: EntryKind) -> usize {
        self.completed.iter().filter(|c| c.kind == kind).count()
            + self.failures.iter().filter(|f| f.kind == kind).count()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// `Ok(self)` when every entry succeeded, `EntriesFailed` otherwise.
    pub fn into_result(self) -> SyncResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(SyncError::EntriesFailed(self))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudsync_store::StoreError;

    fn done(key: &str, kind: EntryKind, decision: Decision) -> EntryOutcome {
        Ok(CompletedEntry {
            key: ObjectKey::new(key).unwrap(),
            kind,
            decision,
        })
    }

    fn failed(key: &str) -> EntryOutcome {
        Err(FailedEntry {
            key: ObjectKey::new(key).unwrap(),
            kind: EntryKind::File,
            local_path: Some(PathBuf::from(format!("/src/{key}"))),
            error: EntryError::Upload(StoreError::Transport("reset".into())),
        })
    }

    #[test]
    fn counts_by_decision() {
        let report = SyncReport::from_outcomes(vec![
            done("d", EntryKind::Directory, Decision::Created),
            done("d/a", EntryKind::File, Decision::Uploaded),
            done("d/b", EntryKind::File, Decision::Unchanged),
            done("d/c", EntryKind::File, Decision::Unchanged),
        ]);
        assert_eq!(report.created(), 1);
        assert_eq!(report.uploaded(), 1);
        assert_eq!(report.unchanged(), 2);
        assert_eq!(report.total(), 4);
        assert_eq!(report.decisions_for(EntryKind::Directory), 1);
        assert_eq!(report.decisions_for(EntryKind::File), 3);
        assert!(report.is_success());
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn any_failure_fails_the_run() {
        let report = SyncReport::from_outcomes(vec![
            done("a", EntryKind::File, Decision::Uploaded),
            failed("b"),
        ]);
        assert!(!report.is_success());
        match report.into_result() {
            Err(SyncError::EntriesFailed(report)) => {
                assert_eq!(report.failed(), 1);
                assert_eq!(report.failures()[0].key.as_str(), "b");
                assert_eq!(report.uploaded(), 1);
            }
            other => panic!("expected EntriesFailed, got {other:?}"),
        }
    }

    #[test]
    fn outcomes_are_sorted_by_key() {
        let report = SyncReport::from_outcomes(vec![
            failed("z"),
            done("m", EntryKind::File, Decision::Uploaded),
            failed("a"),
            done("b", EntryKind::File, Decision::Uploaded),
        ]);
        let completed: Vec<&str> = report.completed().iter().map(|c| c.key.as_str()).collect();
        let failures: Vec<&str> = report.failures().iter().map(|f| f.key.as_str()).collect();
        assert_eq!(completed, vec!["b", "m"]);
        assert_eq!(failures, vec!["a", "z"]);
    }

    #[test]
    fn failed_entry_display_names_key_and_cause() {
        let Err(entry) = failed("docs/x.txt") else {
            unreachable!()
        };
        let text = entry.to_string();
        assert!(text.starts_with("docs/x.txt (/src/docs/x.txt): upload failed"));
        assert!(text.contains("reset"));
    }

    #[test]
    fn failed_entry_without_path_shows_key_only() {
        let entry = FailedEntry {
            key: ObjectKey::new("docs").unwrap(),
            kind: EntryKind::Directory,
            local_path: None,
            error: EntryError::Marker(StoreError::Transport("reset".into())),
        };
        assert_eq!(
            entry.to_string(),
            "docs: cannot write directory marker: transport error: reset"
        );
    }

    #[test]
    fn failure_event_carries_local_path_and_cause() {
        let Err(entry) = failed("docs/x.txt") else {
            unreachable!()
        };
        let event = SyncEvent::from(&entry);
        assert_eq!(event.status, SyncStatus::Failed);
        assert_eq!(event.kind, EntryKind::File);
        assert_eq!(
            event.local_path.as_deref(),
            Some(std::path::Path::new("/src/docs/x.txt"))
        );
        assert!(event.error.as_deref().unwrap().contains("upload failed"));
    }

    #[test]
    fn empty_report_is_success() {
        let report = SyncReport::default();
        assert!(report.is_success());
        assert_eq!(report.total(), 0);
    }
}
