/// Errors that can occur during frame encoding or stream decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;

/// Errors raised while reading typed values out of a text payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataError {
    /// The payload is not valid UTF-8.
    #[error("payload is not valid utf-8")]
    NotUtf8,

    /// Fewer tokens than the caller expected.
    #[error("missing token {index} (payload has {len})")]
    MissingToken { index: usize, len: usize },

    /// A token could not be converted to the expected type.
    #[error("token {index} '{token}' is not a valid {expected}")]
    InvalidToken {
        index: usize,
        token: String,
        expected: &'static str,
    },
}
