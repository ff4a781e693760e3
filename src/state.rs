//! Shared progress state for one copy operation.
//!
//! The rich progress fields live behind a mutex and are always read and
//! written as a group. The cancel flag is a separate atomic so the copy
//! primitive's callback can check it without touching a lock the progress
//! writer might already hold.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// A consistent view of the progress fields, taken under the lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    /// Derived percentage, 0-100. Capped at 99 until the copy is confirmed
    /// complete, then forced to 100.
    pub percent: u8,
    pub bytes_transferred: u64,
    pub bytes_total: u64,
    /// Whether every chunk so far used the offload path.
    pub offloaded: bool,
}

/// Progress and cancellation state shared between the copy worker and the
/// controller.
pub struct SharedCopyState {
    inner: Mutex<ProgressSnapshot>,
    cancel: AtomicBool,
}

impl SharedCopyState {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(ProgressSnapshot {
                percent: 0,
                bytes_transferred: 0,
                bytes_total: 0,
                // Starts true and can only be narrowed by updates.
                offloaded: true,
            }),
            cancel: AtomicBool::new(false),
        }
    }

    /// Record a chunk callback. Clamps `transferred` to `total`, derives the
    /// percentage, and narrows the offload flag by logical AND. Returns the
    /// snapshot taken inside the same critical section so the caller reports
    /// a consistent combination of fields.
    pub fn update(&self, transferred: u64, total: u64, offloaded: bool) -> ProgressSnapshot {
        let mut inner = self.inner.lock().unwrap();
        inner.bytes_total = total;
        inner.bytes_transferred = transferred.min(total);
        inner.percent = if total > 0 {
            ((inner.bytes_transferred as u128 * 99) / total as u128).min(99) as u8
        } else {
            99
        };
        inner.offloaded &= offloaded;
        inner.clone()
    }

    /// Force the percentage to 100 once the copy call has returned.
    pub fn mark_complete(&self) -> ProgressSnapshot {
        let mut inner = self.inner.lock().unwrap();
        inner.percent = 100;
        inner.clone()
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.inner.lock().unwrap().clone()
    }

    pub fn request_cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Safe to call from the copy primitive's callback context.
    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }
}

impl Default for SharedCopyState {
    fn default() -> Self {
        Self::new()
    }
}
