use std::net::SocketAddr;
use std::time::Duration;

/// Errors that can occur in network transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Host name resolution failed.
    #[error("failed to resolve {host}:{port}: {source}")]
    Resolve {
        host: String,
        port: u16,
        source: std::io::Error,
    },

    /// Resolution succeeded but yielded no addresses.
    #[error("no addresses found for {host}:{port}")]
    NoAddress { host: String, port: u16 },

    /// Failed to connect to the specified address.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// Failed to bind a local socket.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// The operation did not complete before its deadline.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// An I/O error occurred on an established socket.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A discovery datagram did not match `robot ip <addr>`.
    #[error("invalid discovery broadcast: {0}")]
    InvalidBroadcast(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;
