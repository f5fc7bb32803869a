use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use tracing::debug;

use crate::codec::{encode_frame, Frame, FrameConfig};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes complete frames to any `Write` stream.
///
/// Every frame is flushed before `send` returns, so the peer never waits on
/// a buffered byte. The stream is expected to be blocking: `WouldBlock` is
/// returned to the caller as an I/O error, not retried.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
    frames_written: u64,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            frames_written: 0,
        }
    }

    /// Write a complete frame (blocking).
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.send(frame.payload.as_ref())
    }

    /// Encode, write and flush a payload.
    ///
    /// Payloads are unbounded unless `max_outbound_frame_size` is set.
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        if let Some(max) = self.config.max_outbound_frame_size {
            if payload.len() > max {
                return Err(FrameError::PayloadTooLarge {
                    size: payload.len(),
                    max,
                });
            }
        }

        self.buf.clear();
        encode_frame(payload, &mut self.buf);

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()?;
        self.frames_written += 1;
        debug!(size = payload.len(), seq = self.frames_written, "frame written");
        Ok(())
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Number of frames written and flushed so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Set or clear the outbound payload cap for subsequent frames.
    pub fn set_max_outbound_frame_size(&mut self, max: Option<usize>) {
        self.config.max_outbound_frame_size = max;
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}
