//! Error taxonomy and exit-code mapping.

use std::io;
use thiserror::Error;

/// Exit code for a user-cancelled copy whose cleanup ran. Distinct from any
/// failure code so scripts can tell "user aborted" from "copy failed".
pub const EXIT_CANCELLED: u8 = 130;

/// Exit code for a wrong argument count.
pub const EXIT_INVALID_ARGUMENTS: u8 = 2;

/// Everything that can stop a run before or outside the copy itself. A
/// failure of the copy primitive is carried in `CopyOutcome::Failed` instead,
/// since it is the worker's exit value rather than a controller error.
#[derive(Debug, Error)]
pub enum CopyError {
    #[error("Invalid number of arguments passed. Needs Source and Destination as arguments.")]
    InvalidArguments,

    #[error("Source file \"{path}\" does not exist or failed to be verified: {source}")]
    SourceNotFound {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Destination path \"{path}\" is invalid or failed to be verified: {source}")]
    DestinationPathInvalid {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to start the copy worker: {0}")]
    WorkerSpawnFailed(#[source] io::Error),

    #[error("Failed to install the cancellation handler: {0}")]
    SignalSetupFailed(#[source] ctrlc::Error),
}

impl CopyError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidArguments => EXIT_INVALID_ARGUMENTS,
            Self::SourceNotFound { source, .. }
            | Self::DestinationPathInvalid { source, .. }
            | Self::WorkerSpawnFailed(source) => {
                clamp_exit_code(source.raw_os_error().unwrap_or(1))
            }
            Self::SignalSetupFailed(_) => 1,
        }
    }
}

/// Squeeze a platform error code into the 1..=255 range a process can exit
/// with; anything unrepresentable becomes a generic 1.
pub fn clamp_exit_code(code: i32) -> u8 {
    if (1..=255).contains(&code) {
        code as u8
    } else {
        1
    }
}
