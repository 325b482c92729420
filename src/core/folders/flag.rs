//! In-memory folder change tracker.

use crate::core::coordinator::FolderChangeTracker;
use std::sync::atomic::{AtomicBool, Ordering};

/// Thread-safe "folders changed" flag
///
/// Set by the [`FolderWatcher`](super::FolderWatcher) (or by the app when
/// the user edits collection folders) and consumed by the coordinator.
#[derive(Debug, Default)]
pub struct FolderChangeFlag {
    changed: AtomicBool,
}

impl FolderChangeFlag {
    /// Create a flag with no pending change
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a flag with a pending change, e.g. on first start
    pub fn changed() -> Self {
        Self {
            changed: AtomicBool::new(true),
        }
    }

    /// Record that collection folders changed
    pub fn mark_changed(&self) {
        self.changed.store(true, Ordering::Release);
    }
}

impl FolderChangeTracker for FolderChangeFlag {
    fn have_folders_changed(&self) -> bool {
        self.changed.load(Ordering::Acquire)
    }

    fn reset_folder_changes(&self) {
        self.changed.store(false, Ordering::Release);
    }
}
