//! Length-prefixed message framing for wasmpipe channels.
//!
//! Every message on either channel is framed as:
//! - the payload length as decimal ASCII digits
//! - a single `,` separator
//! - exactly that many raw payload bytes
//!
//! There is no trailing delimiter; the next header starts right after the
//! payload. Callers only ever see complete frames.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub mod async_codec;

pub use codec::{
    decode_frame, decode_header, decode_payload, encode, encode_frame, max_header_len, Frame,
    FrameConfig, MAX_FRAME_SIZE, MAX_HEADER_LEN, READ_CHUNK_SIZE, SEPARATOR,
};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;

#[cfg(feature = "async")]
pub use async_codec::PipeCodec;
