//! The bulk-copy primitive.
//!
//! `BulkCopy` is the seam between the worker and whatever actually moves
//! bytes. The shipped implementation, `ChunkedCopier`, copies in chunks and
//! reports each one through a tagged event callback; on Linux it first tries
//! kernel-assisted `copy_file_range` (the "offload" path) and degrades to
//! buffered read/write when that is unavailable.

use std::cmp;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// Aim for roughly this many progress callbacks per copy.
const TARGET_UPDATES: u64 = 128;
/// Never go below this chunk size.
const MIN_CHUNK_SIZE: usize = 64 * 1024;
/// Never go above this chunk size; the buffered fallback allocates one
/// chunk's worth of memory, so this also bounds the buffer.
const MAX_CHUNK_SIZE: usize = 8 * 1024 * 1024;

/// Options understood by the bulk-copy primitive.
#[derive(Debug, Clone)]
pub struct CopyFlags {
    /// Carry the source's modification time over to the destination.
    pub preserve_mtime: bool,
    /// Attempt the kernel offload path where the platform supports it.
    pub allow_offload: bool,
    /// Fixed chunk size; `None` derives one from the file size.
    pub chunk_size: Option<usize>,
}

impl Default for CopyFlags {
    fn default() -> Self {
        Self {
            preserve_mtime: true,
            allow_offload: true,
            chunk_size: None,
        }
    }
}

/// Progress messages emitted by the primitive. Consumers match on the kinds
/// they care about and ignore the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyEvent {
    /// Emitted once before the first chunk.
    StreamStarted { bytes_total: u64 },
    /// Emitted after each chunk lands in the destination.
    ChunkFinished {
        bytes_transferred: u64,
        bytes_total: u64,
        /// Whether this chunk went through the offload path.
        offloaded: bool,
    },
}

/// The observer's answer to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyAction {
    Continue,
    /// Stop copying. No further events fire once this is honored.
    Abort,
}

/// How the copy call ended when it did not fail with an I/O error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStatus {
    Completed,
    /// The observer asked for an abort and the primitive honored it.
    Aborted,
}

/// Per-chunk observer. Polled at every chunk boundary, which bounds the
/// worst-case latency of a cooperative abort.
pub type CopyObserver<'a> = dyn FnMut(CopyEvent) -> CopyAction + 'a;

/// The external facility that performs the byte-level duplication.
pub trait BulkCopy {
    fn copy(
        &self,
        source: &Path,
        destination: &Path,
        flags: &CopyFlags,
        observe: &mut CopyObserver,
    ) -> io::Result<CopyStatus>;
}

fn suggested_chunk_size(total: u64) -> usize {
    (total / TARGET_UPDATES).clamp(MIN_CHUNK_SIZE as u64, MAX_CHUNK_SIZE as u64) as usize
}

/// Chunked copier with an offload fast path.
#[derive(Debug, Default)]
pub struct ChunkedCopier;

impl BulkCopy for ChunkedCopier {
    fn copy(
        &self,
        source: &Path,
        destination: &Path,
        flags: &CopyFlags,
        observe: &mut CopyObserver,
    ) -> io::Result<CopyStatus> {
        let mut src = File::open(source)?;
        let total = src.metadata()?.len();
        let mut dst = File::create(destination)?;

        if observe(CopyEvent::StreamStarted { bytes_total: total }) == CopyAction::Abort {
            return Ok(CopyStatus::Aborted);
        }

        let chunk = flags.chunk_size.unwrap_or_else(|| suggested_chunk_size(total));
        // Sized on the first buffered chunk; the offload path never needs it.
        let mut buffer: Vec<u8> = Vec::new();
        let mut offload_ok = flags.allow_offload;
        let mut transferred = 0u64;

        while transferred < total {
            let want = cmp::min(chunk as u64, total - transferred) as usize;
            let (copied, offloaded) =
                transfer_chunk(&mut src, &mut dst, want, &mut buffer, &mut offload_ok)?;
            if copied == 0 {
                // Source shrank underneath us; stop at what we have.
                break;
            }
            transferred += copied as u64;

            let event = CopyEvent::ChunkFinished {
                bytes_transferred: transferred,
                bytes_total: total,
                offloaded,
            };
            if observe(event) == CopyAction::Abort {
                return Ok(CopyStatus::Aborted);
            }
        }

        dst.flush()?;

        if flags.preserve_mtime {
            if let Ok(modified) = src.metadata().and_then(|m| m.modified()) {
                let _ = filetime::set_file_mtime(
                    destination,
                    filetime::FileTime::from_system_time(modified),
                );
            }
        }

        Ok(CopyStatus::Completed)
    }
}

/// Move up to `want` bytes from `src` to `dst`, preferring the offload path
/// while it keeps working. Returns the byte count and whether the chunk was
/// offloaded.
#[cfg(target_os = "linux")]
fn transfer_chunk(
    src: &mut File,
    dst: &mut File,
    want: usize,
    buffer: &mut Vec<u8>,
    offload_ok: &mut bool,
) -> io::Result<(usize, bool)> {
    if *offload_ok {
        match nix::fcntl::copy_file_range(&*src, None, &*dst, None, want) {
            Ok(copied) => return Ok((copied, true)),
            // EXDEV, unsupported filesystem, etc. Stay on the buffered path
            // from here on so the offload flag narrows once and for all.
            Err(_) => *offload_ok = false,
        }
    }
    buffered_chunk(src, dst, want, buffer)
}

#[cfg(not(target_os = "linux"))]
fn transfer_chunk(
    src: &mut File,
    dst: &mut File,
    want: usize,
    buffer: &mut Vec<u8>,
    offload_ok: &mut bool,
) -> io::Result<(usize, bool)> {
    *offload_ok = false;
    buffered_chunk(src, dst, want, buffer)
}

fn buffered_chunk(
    src: &mut File,
    dst: &mut File,
    want: usize,
    buffer: &mut Vec<u8>,
) -> io::Result<(usize, bool)> {
    use std::io::Read;

    if buffer.len() < want {
        buffer.resize(want, 0);
    }
    let read = src.read(&mut buffer[..want])?;
    if read > 0 {
        dst.write_all(&buffer[..read])?;
    }
    Ok((read, false))
}
