//! Copies between the framing layer and guest linear memory.
//!
//! The functions here take the guest memory as a plain byte slice borrowed
//! for one host call only. Callers re-fetch the slice on every call because
//! the guest may grow its memory between calls.

use std::ops::Range;

use tracing::debug;
use wasmpipe_frame::FrameError;

use crate::session::PipeSession;

/// Errors raised while servicing a guest's host call.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The guest-supplied range does not fit in its current memory.
    #[error("guest memory range out of bounds (offset {offset}, length {len}, memory size {size})")]
    MemoryBounds { offset: u64, len: u64, size: usize },

    /// The guest does not export a linear memory named `memory`.
    #[error("guest does not export linear memory \"memory\"")]
    MissingMemory,

    /// Reading or writing a frame failed.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
}

impl BridgeError {
    /// Whether the failure came from a malformed inbound stream.
    pub fn is_protocol(&self) -> bool {
        matches!(self, BridgeError::Frame(err) if err.is_protocol())
    }
}

/// Validate `[offset, offset + len)` against a memory of `size` bytes.
pub fn guest_range(offset: u32, len: usize, size: usize) -> Result<Range<usize>, BridgeError> {
    let start = offset as usize;
    start
        .checked_add(len)
        .filter(|&end| end <= size)
        .map(|end| start..end)
        .ok_or(BridgeError::MemoryBounds {
            offset: u64::from(offset),
            len: len as u64,
            size,
        })
}

/// Service `read_pipe`: block for one inbound frame and copy it to `offset`.
///
/// Returns the payload length. The destination is checked after the frame is
/// decoded; an out-of-range destination leaves guest memory untouched.
pub fn read_pipe(
    session: &mut PipeSession,
    memory: &mut [u8],
    offset: u32,
) -> Result<u32, BridgeError> {
    let frame = session.reader_mut().read_frame()?;
    let range = guest_range(offset, frame.len(), memory.len())?;
    let len = u32::try_from(frame.len()).map_err(|_| BridgeError::MemoryBounds {
        offset: u64::from(offset),
        len: frame.len() as u64,
        size: memory.len(),
    })?;

    memory[range].copy_from_slice(&frame.payload);
    debug!(offset, size = len, "frame delivered to guest");
    Ok(len)
}

/// Service `write_pipe`: emit `len` bytes of guest memory at `offset` as one
/// outbound frame.
pub fn write_pipe(
    session: &mut PipeSession,
    memory: &[u8],
    offset: u32,
    len: u32,
) -> Result<(), BridgeError> {
    let range = guest_range(offset, len as usize, memory.len())?;
    session.writer_mut().send(&memory[range])?;
    debug!(offset, size = len, "frame emitted by guest");
    Ok(())
}
