use std::io::Read;

use tracing::debug;

use crate::codec::{decode_header, decode_payload_chunked, Frame, FrameConfig};
use crate::error::Result;

/// Reads complete frames from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete frames.
/// The header is read byte by byte and the payload in bounded chunks, so a
/// call never consumes bytes that belong to the next frame.
pub struct FrameReader<T> {
    inner: T,
    config: FrameConfig,
    frames_read: u64,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            config,
            frames_read: 0,
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn read_frame(&mut self) -> Result<Frame> {
        let len = decode_header(&mut self.inner, self.config.max_frame_size)?;
        let payload = decode_payload_chunked(&mut self.inner, len, self.config.read_chunk_size)?;
        self.frames_read += 1;
        debug!(size = len, seq = self.frames_read, "frame read");
        Ok(Frame { payload })
    }

    /// Number of complete frames read so far.
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update maximum frame size for subsequent frame decoding.
    pub fn set_max_frame_size(&mut self, max_frame_size: usize) {
        self.config.max_frame_size = max_frame_size;
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}
