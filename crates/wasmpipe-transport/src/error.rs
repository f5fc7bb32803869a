use std::path::PathBuf;

/// Errors that can occur while opening or creating channel pipes.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open a pipe endpoint.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to create a named pipe.
    #[error("failed to create pipe {path}: {source}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The path exists but is not a named pipe.
    #[error("existing path is not a named pipe: {path}")]
    NotAFifo { path: PathBuf },

    /// An I/O error occurred on the transport.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
