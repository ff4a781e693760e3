//! One-shot cancellation notification wired to the process signal handler.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender};

/// Level-triggered cancel notification: once fired it stays set, and exactly
/// one message becomes available on the channel the controller selects on.
pub struct CancelSignal {
    fired: Arc<AtomicBool>,
    tx: Sender<()>,
    rx: Receiver<()>,
}

impl CancelSignal {
    pub fn new() -> Self {
        let (tx, rx) = bounded(1);
        Self {
            fired: Arc::new(AtomicBool::new(false)),
            tx,
            rx,
        }
    }

    /// Register the Ctrl+C / termination handler. The handler body is a
    /// single atomic swap plus a `try_send` on the pre-allocated channel, so
    /// it is safe in the restricted signal context. Later signals are no-ops.
    pub fn install(&self) -> Result<(), ctrlc::Error> {
        let fired = Arc::clone(&self.fired);
        let tx = self.tx.clone();
        ctrlc::set_handler(move || {
            if !fired.swap(true, Ordering::SeqCst) {
                let _ = tx.try_send(());
            }
        })
    }

    /// Fire the notification from within the process. Tests and embedders
    /// use this in place of an actual signal.
    pub fn trigger(&self) {
        if !self.fired.swap(true, Ordering::SeqCst) {
            let _ = self.tx.try_send(());
        }
    }

    pub fn is_set(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Channel the controller's select blocks on.
    pub fn notified(&self) -> &Receiver<()> {
        &self.rx
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_fires_exactly_once() {
        let cancel = CancelSignal::new();
        assert!(!cancel.is_set());

        cancel.trigger();
        cancel.trigger();
        cancel.trigger();

        assert!(cancel.is_set());
        assert!(cancel.notified().try_recv().is_ok());
        // One shot: later signals queued nothing further.
        assert!(cancel.notified().try_recv().is_err());
    }

    #[test]
    fn stays_set_after_the_message_is_consumed() {
        let cancel = CancelSignal::new();
        cancel.trigger();
        let _ = cancel.notified().recv();
        assert!(cancel.is_set());
    }
}
