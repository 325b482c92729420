//! # Guard Module
//!
//! Single-flight guard shared by every indexing entry point.
//!
//! `RunGuard::try_enter` is one atomic compare-and-set, so two callers on
//! different threads can never both observe "idle" and start a pass. The
//! returned `RunPermit` clears the flag when dropped, which covers normal
//! completion, `?` early returns and unwinding panics alike.

use std::sync::atomic::{AtomicBool, Ordering};

/// Run-in-progress flag
#[derive(Debug, Default)]
pub struct RunGuard {
    running: AtomicBool,
}

impl RunGuard {
    /// Create an idle guard
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
        }
    }

    /// Try to claim the guard.
    ///
    /// Returns `None` when another pass already holds it.
    pub fn try_enter(&self) -> Option<RunPermit<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunPermit { guard: self })
    }

    /// Whether a pass currently holds the guard
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Proof that the holder owns the guard; releases it on drop
#[must_use = "the guard is released as soon as the permit is dropped"]
#[derive(Debug)]
pub struct RunPermit<'a> {
    guard: &'a RunGuard,
}

impl Drop for RunPermit<'_> {
    fn drop(&mut self) {
        self.guard.running.store(false, Ordering::Release);
    }
}
