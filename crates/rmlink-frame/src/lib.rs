//! Checksummed binary framing for the RoboMaster control link.
//!
//! Every frame carries:
//! - A 2-byte magic number (`0xA5 0x5A`) for stream synchronization
//! - A 1-byte kind (Command, Reply, Fault, Push)
//! - A 2-byte little-endian key: correlation key, or channel ID for pushes
//! - A 2-byte little-endian payload length
//! - A 2-byte checksum over kind through payload
//!
//! Decoding is pure and resynchronizes after corrupt input. Payloads are the
//! robot's plaintext token language, built with [`Command`] and read back with
//! [`Response`].

pub mod channel;
pub mod codec;
pub mod command;
pub mod error;
#[cfg(feature = "async")]
pub mod framed;
pub mod response;

pub use codec::{
    checksum, decode_frame, encode_frame, Decoded, Frame, FrameConfig, FrameKind, Malformed,
    MalformedReason, CHECKSUM_SIZE, DEFAULT_MAX_PAYLOAD, HEADER_SIZE, MAGIC,
};
pub use command::{Command, CommandArg};
pub use error::{DataError, FrameError, Result};
#[cfg(feature = "async")]
pub use framed::FrameCodec;
pub use response::Response;
