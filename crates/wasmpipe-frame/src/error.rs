/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// No `,` separator appeared within the header length bound.
    #[error("frame header {header:?} has no ',' separator within {max} bytes")]
    MissingSeparator { header: String, max: usize },

    /// The header is not a non-negative decimal integer.
    #[error("invalid frame length header {header:?}")]
    InvalidLength { header: String },

    /// The declared payload length exceeds the configured maximum.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream was closed before a complete frame was transferred.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

impl FrameError {
    /// Whether this is a malformed-stream error rather than an I/O failure.
    ///
    /// Protocol errors leave the stream at an unknown frame boundary.
    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            FrameError::MissingSeparator { .. }
                | FrameError::InvalidLength { .. }
                | FrameError::PayloadTooLarge { .. }
        )
    }

    pub(crate) fn missing_separator(header: &[u8], max: usize) -> Self {
        FrameError::MissingSeparator {
            header: String::from_utf8_lossy(header).into_owned(),
            max,
        }
    }

    pub(crate) fn invalid_length(header: &[u8]) -> Self {
        FrameError::InvalidLength {
            header: String::from_utf8_lossy(header).into_owned(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
