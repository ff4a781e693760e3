//! The copy worker: adapts the bulk-copy primitive's event stream into
//! shared-state updates and reporter lines, and polls the cancel flag.

use std::path::PathBuf;

use log::debug;

use crate::copy::{BulkCopy, CopyAction, CopyEvent, CopyFlags, CopyStatus};
use crate::progress::Reporter;
use crate::state::SharedCopyState;

/// One outstanding copy operation.
#[derive(Debug, Clone)]
pub struct CopyTask {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub flags: CopyFlags,
}

/// Terminal result of a worker run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    Succeeded,
    /// The primitive honored the abort instruction.
    Cancelled,
    /// The primitive failed with a platform error code.
    Failed(i32),
}

/// Run one copy to completion, cancellation, or failure.
///
/// Always marks the shared state complete and emits a final progress line,
/// also when the primitive reported failure or honored an abort.
pub fn run(
    task: &CopyTask,
    state: &SharedCopyState,
    reporter: &dyn Reporter,
    copier: &dyn BulkCopy,
) -> CopyOutcome {
    debug!(
        "copy worker starting: {} -> {}",
        task.source.display(),
        task.destination.display()
    );

    let result = copier.copy(
        &task.source,
        &task.destination,
        &task.flags,
        &mut |event| {
            match event {
                CopyEvent::ChunkFinished {
                    bytes_transferred,
                    bytes_total,
                    offloaded,
                } => {
                    let snapshot = state.update(bytes_transferred, bytes_total, offloaded);
                    reporter.progress(&snapshot);
                }
                // Other message kinds carry nothing we track.
                _ => {}
            }
            if state.is_cancel_requested() {
                CopyAction::Abort
            } else {
                CopyAction::Continue
            }
        },
    );

    let outcome = match result {
        Ok(CopyStatus::Completed) => CopyOutcome::Succeeded,
        Ok(CopyStatus::Aborted) => CopyOutcome::Cancelled,
        Err(e) => {
            reporter.error(&format!("Copy failed: {}", e));
            CopyOutcome::Failed(e.raw_os_error().unwrap_or(1))
        }
    };

    let snapshot = state.mark_complete();
    reporter.progress(&snapshot);

    debug!("copy worker finished: {:?}", outcome);
    outcome
}
