//! Error types for the host crate.

use thiserror::Error;

use crate::bridge::BridgeError;

/// Host error type
#[derive(Error, Debug)]
pub enum HostError {
    /// Failed to open or create a channel pipe
    #[error("transport error: {0}")]
    Transport(#[from] wasmpipe_transport::TransportError),

    /// A host function call failed; the guest was trapped
    #[error("host call failed: {0}")]
    Bridge(#[from] BridgeError),

    /// Engine, compilation, linking or instantiation error
    #[error("WASM engine error: {0}")]
    Engine(String),

    /// The guest does not export a required item
    #[error("guest export missing: {0}")]
    MissingExport(String),

    /// The guest trapped on its own (not through a host call)
    #[error("guest trapped: {0}")]
    GuestTrap(String),

    /// The guest called `proc_exit` with a non-zero status
    #[error("guest exited with status {0}")]
    GuestExit(i32),

    /// The module bytes could not be decoded
    #[error("invalid module encoding: {0}")]
    ModuleEncoding(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for host operations
pub type Result<T> = std::result::Result<T, HostError>;
