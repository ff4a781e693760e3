//! OFCP - Offload-Aware File Copy
//!
//! Core library for a single bulk file copy with live progress reporting,
//! cooperative Ctrl+C cancellation, and cleanup of a partially-written
//! destination after an abort.

pub mod args;
pub mod copy;
pub mod state;

mod cancel;
mod controller;
mod errors;
mod progress;
mod worker;

pub use args::CopyOptions;
pub use cancel::CancelSignal;
pub use controller::Controller;
pub use copy::{BulkCopy, ChunkedCopier, CopyAction, CopyEvent, CopyFlags, CopyStatus};
pub use errors::{clamp_exit_code, CopyError, EXIT_CANCELLED, EXIT_INVALID_ARGUMENTS};
pub use progress::{format_progress_line, ConsoleReporter, NullReporter, Reporter};
pub use state::{ProgressSnapshot, SharedCopyState};
pub use worker::{CopyOutcome, CopyTask};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "OFCP";
