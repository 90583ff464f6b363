//! Outcome of a sync run.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Counts of what a run changed on each side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Local contacts deleted because their remote record is gone.
    pub local_deleted: usize,
    /// Remote contacts deleted because their local record is gone.
    pub remote_deleted: usize,
    /// Local contacts whose remote identifier was cleared.
    pub unlinked: usize,
    /// Local contacts overwritten with newer remote fields.
    pub pulled: usize,
    /// Remote contacts overwritten with newer local fields.
    pub pushed: usize,
    pub remote_created: usize,
    pub local_created: usize,
    /// Same-name equivalent pairs linked without creating anything.
    pub linked: usize,
    /// Records left alone because of a name clash or a per-record failure.
    pub skipped: usize,
    #[serde(skip)]
    pub duration: Duration,
}

impl SyncReport {
    /// Whether the run created, updated, deleted or linked nothing.
    pub fn is_noop(&self) -> bool {
        self.local_deleted == 0
            && self.remote_deleted == 0
            && self.unlinked == 0
            && self.pulled == 0
            && self.pushed == 0
            && self.remote_created == 0
            && self.local_created == 0
            && self.linked == 0
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created {} remote / {} local, pushed {}, pulled {}, linked {}, \
             deleted {} remote / {} local, unlinked {}, skipped {} ({:?})",
            self.remote_created,
            self.local_created,
            self.pushed,
            self.pulled,
            self.linked,
            self.remote_deleted,
            self.local_deleted,
            self.unlinked,
            self.skipped,
            self.duration,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_noop() {
        assert!(SyncReport::default().is_noop());
    }

    #[test]
    fn test_skips_do_not_count_as_changes() {
        let report = SyncReport {
            skipped: 3,
            ..Default::default()
        };
        assert!(report.is_noop());

        let report = SyncReport {
            linked: 1,
            ..Default::default()
        };
        assert!(!report.is_noop());
    }
}
