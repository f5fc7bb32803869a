//! Named-pipe channel endpoints.
//!
//! The host talks to its engine over two unidirectional pipes:
//! - an inbound pipe the host only reads from
//! - an outbound pipe the host only writes to
//!
//! This is the lowest layer of wasmpipe. Framing and the guest bridge build
//! on top of the [`InboundPipe`] and [`OutboundPipe`] types provided here.

pub mod error;
pub mod pipe;

#[cfg(unix)]
pub mod fifo;

pub use error::{Result, TransportError};
pub use pipe::{
    ChannelPaths, InboundPipe, OutboundPipe, DEFAULT_INBOUND_PATH, DEFAULT_OUTBOUND_PATH,
};

#[cfg(unix)]
pub use fifo::{create_fifo, is_fifo, DEFAULT_FIFO_MODE};
