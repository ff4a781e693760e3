//! Orchestration: validate, spawn the worker, race completion against
//! cancellation, and reconcile the result.

use std::fs::{self, File};
use std::path::{self, PathBuf};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, select};
use log::{debug, warn};

use crate::args::CopyOptions;
use crate::cancel::CancelSignal;
use crate::copy::{BulkCopy, ChunkedCopier, CopyFlags};
use crate::errors::CopyError;
use crate::progress::Reporter;
use crate::state::SharedCopyState;
use crate::worker::{self, CopyOutcome, CopyTask};

pub struct Controller {
    options: CopyOptions,
    copier: Arc<dyn BulkCopy + Send + Sync>,
}

impl Controller {
    pub fn new(options: CopyOptions) -> Self {
        Self::with_copier(options, Arc::new(ChunkedCopier))
    }

    /// Swap in a different bulk-copy primitive. Tests use scripted and
    /// throttled copiers through this.
    pub fn with_copier(options: CopyOptions, copier: Arc<dyn BulkCopy + Send + Sync>) -> Self {
        Self { options, copier }
    }

    /// Run one copy end to end. Validation failures and infrastructure
    /// failures come back as errors; the copy itself, including cancellation
    /// and primitive failure, comes back as a `CopyOutcome`.
    pub fn run(
        &self,
        cancel: &CancelSignal,
        reporter: Arc<dyn Reporter>,
    ) -> Result<CopyOutcome, CopyError> {
        let (source, destination) = self.validate()?;

        let state = Arc::new(SharedCopyState::new());
        let (done_tx, done_rx) = bounded(1);

        let task = CopyTask {
            source,
            destination: destination.clone(),
            flags: CopyFlags::default(),
        };
        let worker_state = Arc::clone(&state);
        let worker_reporter = Arc::clone(&reporter);
        let worker_copier = Arc::clone(&self.copier);

        let handle = thread::Builder::new()
            .name("copy-worker".into())
            .spawn(move || {
                let outcome = worker::run(
                    &task,
                    &worker_state,
                    worker_reporter.as_ref(),
                    worker_copier.as_ref(),
                );
                let _ = done_tx.send(outcome);
            })
            .map_err(CopyError::WorkerSpawnFailed)?;

        let outcome = select! {
            recv(done_rx) -> msg => {
                reporter.status("Copy thread finished.");
                msg.unwrap_or(CopyOutcome::Failed(1))
            }
            recv(cancel.notified()) -> _ => {
                debug!("cancellation requested; waiting for the copy worker to stop");
                state.request_cancel();
                // Join-wait: bounded only by the primitive's chunk granularity.
                let outcome = done_rx.recv().unwrap_or(CopyOutcome::Failed(1));
                if outcome == CopyOutcome::Cancelled {
                    reporter.status("Copy operation has been cancelled by the user.");
                } else {
                    // The worker finished before it saw the flag; cancellation
                    // is never retroactive.
                    reporter.status("Copy thread finished.");
                }
                outcome
            }
        };

        if handle.join().is_err() {
            warn!("copy worker panicked");
        }

        if outcome == CopyOutcome::Cancelled {
            if let Err(e) = fs::remove_file(&destination) {
                reporter.error(&format!(
                    "Failed to delete the destination file when operation has been cancelled: {}",
                    e
                ));
            }
        }

        Ok(outcome)
    }

    /// Source must open for reading; destination must resolve syntactically.
    fn validate(&self) -> Result<(PathBuf, PathBuf), CopyError> {
        let source = PathBuf::from(&self.options.source);
        if let Err(e) = File::open(&source) {
            return Err(CopyError::SourceNotFound {
                path: self.options.source.clone(),
                source: e,
            });
        }

        let destination = path::absolute(&self.options.destination).map_err(|e| {
            CopyError::DestinationPathInvalid {
                path: self.options.destination.clone(),
                source: e,
            }
        })?;

        Ok((source, destination))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::copy::{CopyAction, CopyEvent, CopyObserver, CopyStatus};
    use crate::progress::MemoryReporter;
    use std::fs;
    use std::io::{self, Write};
    use std::path::Path;
    use std::time::Duration;

    fn options(source: &Path, destination: &Path) -> CopyOptions {
        CopyOptions {
            source: source.to_string_lossy().into_owned(),
            destination: destination.to_string_lossy().into_owned(),
        }
    }

    /// Writes one chunk, then sleeps between cancel polls so the controller's
    /// select always wins the race in the cancellation tests.
    struct ThrottledCopier;

    impl BulkCopy for ThrottledCopier {
        fn copy(
            &self,
            _source: &Path,
            destination: &Path,
            _flags: &CopyFlags,
            observe: &mut CopyObserver,
        ) -> io::Result<CopyStatus> {
            let mut dst = fs::File::create(destination)?;
            dst.write_all(b"partial")?;
            for transferred in 1..=50u64 {
                thread::sleep(Duration::from_millis(10));
                let action = observe(CopyEvent::ChunkFinished {
                    bytes_transferred: transferred * 20,
                    bytes_total: 1000,
                    offloaded: false,
                });
                if action == CopyAction::Abort {
                    return Ok(CopyStatus::Aborted);
                }
            }
            Ok(CopyStatus::Completed)
        }
    }

    #[test]
    fn missing_source_fails_validation_without_touching_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("missing.bin");
        let dst = dir.path().join("out.bin");

        let controller = Controller::new(options(&src, &dst));
        let result = controller.run(&CancelSignal::new(), Arc::new(MemoryReporter::new()));

        assert!(matches!(result, Err(CopyError::SourceNotFound { .. })));
        assert!(!dst.exists());
    }

    #[test]
    fn successful_copy_reports_finished_and_keeps_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.bin");
        let dst = dir.path().join("b.bin");
        let payload = vec![42u8; 10_000];
        fs::write(&src, &payload).unwrap();

        let reporter = Arc::new(MemoryReporter::new());
        let controller = Controller::new(options(&src, &dst));
        let outcome = controller
            .run(&CancelSignal::new(), reporter.clone())
            .unwrap();

        assert_eq!(outcome, CopyOutcome::Succeeded);
        assert_eq!(fs::read(&dst).unwrap(), payload);
        assert_eq!(
            reporter.statuses.lock().unwrap().as_slice(),
            ["Copy thread finished."]
        );
        assert_eq!(*reporter.percents().last().unwrap(), 100);
    }

    #[test]
    fn cancellation_stops_the_worker_and_deletes_the_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.bin");
        let dst = dir.path().join("b.bin");
        fs::write(&src, vec![1u8; 1000]).unwrap();

        let cancel = CancelSignal::new();
        cancel.trigger();

        let reporter = Arc::new(MemoryReporter::new());
        let controller =
            Controller::with_copier(options(&src, &dst), Arc::new(ThrottledCopier));
        let outcome = controller.run(&cancel, reporter.clone()).unwrap();

        assert_eq!(outcome, CopyOutcome::Cancelled);
        assert!(!dst.exists());
        assert_eq!(
            reporter.statuses.lock().unwrap().as_slice(),
            ["Copy operation has been cancelled by the user."]
        );
        // Nothing masked the forced final line.
        assert_eq!(*reporter.percents().last().unwrap(), 100);
    }

    #[test]
    fn failed_cleanup_is_reported_but_outcome_stays_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.bin");
        fs::write(&src, vec![1u8; 1000]).unwrap();
        // A directory at the destination path makes `remove_file` fail.
        let dst = dir.path().join("blocked");
        fs::create_dir(&dst).unwrap();

        /// Never creates the destination; just waits to be told to stop.
        struct AbortOnlyCopier;

        impl BulkCopy for AbortOnlyCopier {
            fn copy(
                &self,
                _source: &Path,
                _destination: &Path,
                _flags: &CopyFlags,
                observe: &mut CopyObserver,
            ) -> io::Result<CopyStatus> {
                loop {
                    thread::sleep(Duration::from_millis(10));
                    let action = observe(CopyEvent::ChunkFinished {
                        bytes_transferred: 0,
                        bytes_total: 1000,
                        offloaded: false,
                    });
                    if action == CopyAction::Abort {
                        return Ok(CopyStatus::Aborted);
                    }
                }
            }
        }

        let cancel = CancelSignal::new();
        cancel.trigger();

        let reporter = Arc::new(MemoryReporter::new());
        let controller =
            Controller::with_copier(options(&src, &dst), Arc::new(AbortOnlyCopier));
        let outcome = controller.run(&cancel, reporter.clone()).unwrap();

        // The deletion failure is surfaced as an extra error line, not a
        // reclassification.
        assert_eq!(outcome, CopyOutcome::Cancelled);
        assert_eq!(reporter.errors.lock().unwrap().len(), 1);
        assert_eq!(
            reporter.statuses.lock().unwrap().as_slice(),
            ["Copy operation has been cancelled by the user."]
        );
        assert!(dst.exists());
    }

    #[test]
    fn late_cancellation_never_reclassifies_a_finished_copy() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.bin");
        let dst = dir.path().join("b.bin");
        fs::write(&src, b"tiny").unwrap();

        /// Completes without ever polling the observer, like a primitive
        /// whose whole copy fits in one internal operation.
        struct InstantCopier;

        impl BulkCopy for InstantCopier {
            fn copy(
                &self,
                source: &Path,
                destination: &Path,
                _flags: &CopyFlags,
                _observe: &mut CopyObserver,
            ) -> io::Result<CopyStatus> {
                fs::copy(source, destination)?;
                Ok(CopyStatus::Completed)
            }
        }

        let cancel = CancelSignal::new();
        cancel.trigger();

        let reporter = Arc::new(MemoryReporter::new());
        let controller = Controller::with_copier(options(&src, &dst), Arc::new(InstantCopier));
        let outcome = controller.run(&cancel, reporter.clone()).unwrap();

        assert_eq!(outcome, CopyOutcome::Succeeded);
        assert!(dst.exists());
        assert_eq!(
            reporter.statuses.lock().unwrap().as_slice(),
            ["Copy thread finished."]
        );
    }

    #[test]
    fn failed_copy_keeps_its_error_code() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.bin");
        let dst = dir.path().join("b.bin");
        fs::write(&src, b"data").unwrap();

        struct BrokenCopier;

        impl BulkCopy for BrokenCopier {
            fn copy(
                &self,
                _source: &Path,
                _destination: &Path,
                _flags: &CopyFlags,
                _observe: &mut CopyObserver,
            ) -> io::Result<CopyStatus> {
                Err(io::Error::from_raw_os_error(5))
            }
        }

        let reporter = Arc::new(MemoryReporter::new());
        let controller = Controller::with_copier(options(&src, &dst), Arc::new(BrokenCopier));
        let outcome = controller
            .run(&CancelSignal::new(), reporter.clone())
            .unwrap();

        assert_eq!(outcome, CopyOutcome::Failed(5));
        assert_eq!(reporter.errors.lock().unwrap().len(), 1);
    }
}
