use std::io::{ErrorKind, Read};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Maximum accepted payload length: 1,000,000 bytes.
pub const MAX_FRAME_SIZE: usize = 1_000_000;

/// Largest single read requested from a stream while collecting a payload.
pub const READ_CHUNK_SIZE: usize = 1024;

/// Byte separating the decimal length from the payload.
pub const SEPARATOR: u8 = b',';

/// Header bound for [`MAX_FRAME_SIZE`]: seven digits plus the separator.
pub const MAX_HEADER_LEN: usize = max_header_len(MAX_FRAME_SIZE);

/// Number of header bytes (digits plus separator) needed to express
/// `max_frame_size`. A header that has not ended by then is rejected.
pub const fn max_header_len(max_frame_size: usize) -> usize {
    decimal_digits(max_frame_size) + 1
}

const fn decimal_digits(mut value: usize) -> usize {
    let mut digits = 1;
    while value >= 10 {
        value /= 10;
        digits += 1;
    }
    digits
}

/// A complete framed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The opaque message payload.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        decimal_digits(self.payload.len()) + 1 + self.payload.len()
    }

    /// Consume the frame and return its payload.
    pub fn into_payload(self) -> Bytes {
        self.payload
    }
}

/// Encode a payload into the wire format, appending to `dst`.
///
/// Wire format:
/// ```text
/// ┌──────────────────┬─────┬──────────────────┐
/// │ Length           │ ',' │ Payload          │
/// │ (decimal ASCII)  │     │ (Length bytes)   │
/// └──────────────────┴─────┴──────────────────┘
/// ```
///
/// The length is always taken from `payload` itself.
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) {
    let header = payload.len().to_string();
    dst.reserve(header.len() + 1 + payload.len());
    dst.put_slice(header.as_bytes());
    dst.put_u8(SEPARATOR);
    dst.put_slice(payload);
}

/// Encode a payload into a fresh buffer.
pub fn encode(payload: &[u8]) -> Bytes {
    let mut dst = BytesMut::new();
    encode_frame(payload, &mut dst);
    dst.freeze()
}

/// Read a frame header from `src`, one byte at a time.
///
/// Stops at the separator, so no payload byte is consumed. Fails on the
/// first non-digit byte, when no separator appears within
/// [`max_header_len`] bytes, or when the length exceeds `max_frame_size`.
pub fn decode_header<R: Read + ?Sized>(src: &mut R, max_frame_size: usize) -> Result<usize> {
    let max_header = max_header_len(max_frame_size);
    let mut digits = Vec::with_capacity(max_header);

    for _ in 0..max_header {
        let byte = read_byte(src)?;
        if byte == SEPARATOR {
            return parse_length(&digits, max_frame_size);
        }
        digits.push(byte);
        if !byte.is_ascii_digit() {
            return Err(FrameError::invalid_length(&digits));
        }
    }

    Err(FrameError::missing_separator(&digits, max_header))
}

/// Read exactly `len` payload bytes from `src` in [`READ_CHUNK_SIZE`] chunks.
pub fn decode_payload<R: Read + ?Sized>(src: &mut R, len: usize) -> Result<Bytes> {
    decode_payload_chunked(src, len, READ_CHUNK_SIZE)
}

/// Read exactly `len` payload bytes, requesting at most `chunk_size` bytes
/// per underlying read. Short reads are accumulated until `len` is reached.
pub fn decode_payload_chunked<R: Read + ?Sized>(
    src: &mut R,
    len: usize,
    chunk_size: usize,
) -> Result<Bytes> {
    let chunk_size = chunk_size.max(1);
    let mut payload = BytesMut::zeroed(len);
    let mut filled = 0usize;

    while filled < len {
        let want = (len - filled).min(chunk_size);
        match src.read(&mut payload[filled..filled + want]) {
            Ok(0) => return Err(FrameError::ConnectionClosed),
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    }

    Ok(payload.freeze())
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer. Header errors are
/// reported as soon as the offending bytes are buffered.
pub fn decode_frame(src: &mut BytesMut, max_frame_size: usize) -> Result<Option<Frame>> {
    let max_header = max_header_len(max_frame_size);
    let scan = src.len().min(max_header);

    let Some(sep) = src[..scan].iter().position(|&b| b == SEPARATOR) else {
        if let Some(bad) = src[..scan].iter().position(|b| !b.is_ascii_digit()) {
            return Err(FrameError::invalid_length(&src[..=bad]));
        }
        if scan == max_header {
            return Err(FrameError::missing_separator(&src[..scan], max_header));
        }
        return Ok(None); // Need more data
    };

    let payload_len = parse_length(&src[..sep], max_frame_size)?;
    let header_len = sep + 1;
    if src.len() < header_len + payload_len {
        return Ok(None); // Need more data
    }

    src.advance(header_len);
    let payload = src.split_to(payload_len).freeze();

    Ok(Some(Frame { payload }))
}

fn parse_length(digits: &[u8], max_frame_size: usize) -> Result<usize> {
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(FrameError::invalid_length(digits));
    }

    let size = std::str::from_utf8(digits)
        .ok()
        .and_then(|text| text.parse::<usize>().ok())
        .ok_or_else(|| FrameError::invalid_length(digits))?;

    if size > max_frame_size {
        return Err(FrameError::PayloadTooLarge {
            size,
            max: max_frame_size,
        });
    }

    Ok(size)
}

fn read_byte<R: Read + ?Sized>(src: &mut R) -> Result<u8> {
    let mut byte = [0u8; 1];
    loop {
        match src.read(&mut byte) {
            Ok(0) => return Err(FrameError::ConnectionClosed),
            Ok(_) => return Ok(byte[0]),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    }
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum inbound payload size in bytes. Default: [`MAX_FRAME_SIZE`].
    pub max_frame_size: usize,
    /// Largest read requested per call while collecting a payload.
    pub read_chunk_size: usize,
    /// Optional cap on outbound payloads. Default: `None` (writes of any
    /// size are framed and sent).
    pub max_outbound_frame_size: Option<usize>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_size: MAX_FRAME_SIZE,
            read_chunk_size: READ_CHUNK_SIZE,
            max_outbound_frame_size: None,
        }
    }
}

impl FrameConfig {
    /// Header bound derived from the maximum frame size.
    pub fn max_header_len(&self) -> usize {
        max_header_len(self.max_frame_size)
    }
}
