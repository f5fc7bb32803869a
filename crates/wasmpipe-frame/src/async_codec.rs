//! `tokio_util::codec` adapter for peers that drive a channel from an async
//! runtime. Framing and bounds are identical to the blocking reader/writer:
//! decoding is capped by `max_frame_size`, encoding only by an explicit
//! outbound limit.

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_frame, encode_frame, Frame, MAX_FRAME_SIZE};
use crate::error::{FrameError, Result};

/// Decoder/encoder for the decimal length-prefixed wire format.
#[derive(Debug, Clone)]
pub struct PipeCodec {
    max_frame_size: usize,
    max_outbound_frame_size: Option<usize>,
}

impl Default for PipeCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl PipeCodec {
    /// Codec bounded by [`MAX_FRAME_SIZE`].
    pub fn new() -> Self {
        Self::with_max_frame_size(MAX_FRAME_SIZE)
    }

    /// Codec with an explicit inbound frame size bound.
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self {
            max_frame_size,
            max_outbound_frame_size: None,
        }
    }

    /// Builder: reject encoded payloads above `max`.
    pub fn with_outbound_limit(mut self, max: usize) -> Self {
        self.max_outbound_frame_size = Some(max);
        self
    }

    /// The bound applied to decoded frames.
    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    /// The bound applied to encoded frames, if any.
    pub fn max_outbound_frame_size(&self) -> Option<usize> {
        self.max_outbound_frame_size
    }
}

impl Decoder for PipeCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        decode_frame(src, self.max_frame_size)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() => Ok(None),
            None => Err(FrameError::ConnectionClosed),
        }
    }
}

impl Encoder<Bytes> for PipeCodec {
    type Error = FrameError;

    fn encode(&mut self, payload: Bytes, dst: &mut BytesMut) -> Result<()> {
        if let Some(max) = self.max_outbound_frame_size {
            if payload.len() > max {
                return Err(FrameError::PayloadTooLarge {
                    size: payload.len(),
                    max,
                });
            }
        }
        encode_frame(&payload, dst);
        Ok(())
    }
}
