use std::time::Duration;

use rmlink_frame::{DataError, FrameKind, Malformed};

/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error (resolve, connect).
    #[error("transport error: {0}")]
    Transport(#[from] rmlink_transport::TransportError),

    /// Frame-level error (encode, read, write).
    #[error("frame error: {0}")]
    Frame(#[from] rmlink_frame::FrameError),

    /// The robot did not complete the handshake.
    #[error("connection failed: {0}")]
    Connection(String),

    /// No reply arrived before the deadline. Whether the robot executed the
    /// command is unknown.
    #[error("'{command}' timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    /// The robot answered with an explicit failure.
    #[error("'{command}' failed on device: {message}")]
    Device { command: String, message: String },

    /// The session closed before the operation completed.
    #[error("session closed")]
    SessionClosed,

    /// Every correlation key is in use.
    #[error("too many commands in flight")]
    KeysExhausted,

    /// A reply payload could not be read as the expected data.
    #[error("data error: {0}")]
    Data(#[from] DataError),
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Unexpected inbound data. Logged and counted; never fatal.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProtocolAnomaly {
    /// Bytes that did not decode as a frame.
    #[error("malformed input: {0}")]
    Malformed(Malformed),

    /// A reply whose key matches no pending command.
    #[error("{} for unknown key {key}", .kind.name())]
    UnknownKey { kind: FrameKind, key: u16 },

    /// A push on a channel nothing listens to.
    #[error("push on unknown channel {0:#06x}")]
    UnknownChannel(u16),

    /// A push whose payload does not parse for its channel.
    #[error("bad payload on channel {channel:#06x}: {source}")]
    BadPayload { channel: u16, source: DataError },

    /// A frame kind the robot never sends.
    #[error("unexpected {} frame", .0.name())]
    UnexpectedKind(FrameKind),
}
