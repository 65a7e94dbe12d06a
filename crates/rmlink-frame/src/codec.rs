use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame header: magic (2) + kind (1) + key (2) + length (2) = 7 bytes.
pub const HEADER_SIZE: usize = 7;

/// Trailing checksum size.
pub const CHECKSUM_SIZE: usize = 2;

/// Magic bytes. Both are outside ASCII, so text payloads never contain them.
pub const MAGIC: [u8; 2] = [0xA5, 0x5A];

/// Default maximum payload size: 4 KiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 4 * 1024;

/// What a frame carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameKind {
    /// Host to robot request; key is the correlation key.
    Command = 0x01,
    /// Successful answer to the command with the same key.
    Reply = 0x02,
    /// Explicit device failure for the command with the same key.
    Fault = 0x03,
    /// Unsolicited telemetry; key is the sensor channel.
    Push = 0x04,
}

impl FrameKind {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::Command),
            0x02 => Some(Self::Reply),
            0x03 => Some(Self::Fault),
            0x04 => Some(Self::Push),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Command => "COMMAND",
            Self::Reply => "REPLY",
            Self::Fault => "FAULT",
            Self::Push => "PUSH",
        }
    }
}

/// A decoded unit of protocol data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub kind: FrameKind,
    /// Correlation key (Command/Reply/Fault) or channel ID (Push).
    pub key: u16,
    pub payload: Bytes,
}

impl Frame {
    pub fn new(kind: FrameKind, key: u16, payload: impl Into<Bytes>) -> Self {
        Self {
            kind,
            key,
            payload: payload.into(),
        }
    }

    pub fn command(key: u16, payload: impl Into<Bytes>) -> Self {
        Self::new(FrameKind::Command, key, payload)
    }

    pub fn reply(key: u16, payload: impl Into<Bytes>) -> Self {
        Self::new(FrameKind::Reply, key, payload)
    }

    pub fn fault(key: u16, payload: impl Into<Bytes>) -> Self {
        Self::new(FrameKind::Fault, key, payload)
    }

    pub fn push(channel: u16, payload: impl Into<Bytes>) -> Self {
        Self::new(FrameKind::Push, channel, payload)
    }

    /// The total wire size of this frame (header + payload + checksum).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len() + CHECKSUM_SIZE
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌───────────┬──────┬──────────┬──────────┬─────────────┬──────────┐
/// │ Magic(2B) │ Kind │ Key      │ Length   │ Payload     │ Checksum │
/// │ 0xA5 0x5A │ (1B) │ (2B LE)  │ (2B LE)  │ (Length B)  │ (2B LE)  │
/// └───────────┴──────┴──────────┴──────────┴─────────────┴──────────┘
/// ```
///
/// The checksum covers kind through the end of the payload.
pub fn encode_frame(frame: &Frame, dst: &mut BytesMut) -> Result<()> {
    let len = u16::try_from(frame.payload.len()).map_err(|_| FrameError::PayloadTooLarge {
        size: frame.payload.len(),
        max: u16::MAX as usize,
    })?;

    dst.reserve(frame.wire_size());
    let start = dst.len();
    dst.put_slice(&MAGIC);
    dst.put_u8(frame.kind.as_byte());
    dst.put_u16_le(frame.key);
    dst.put_u16_le(len);
    dst.put_slice(&frame.payload);
    let sum = checksum(&dst[start + MAGIC.len()..]);
    dst.put_u16_le(sum);
    Ok(())
}

/// Why a span of bytes was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedReason {
    /// Bytes before the next magic sequence.
    Garbage,
    /// Header names a kind this protocol does not define.
    UnknownKind(u8),
    /// Header claims more payload than the configured maximum.
    PayloadTooLarge { size: usize, max: usize },
    /// Frame is complete but its checksum does not match.
    ChecksumMismatch { expected: u16, actual: u16 },
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Garbage => f.write_str("garbage before frame magic"),
            Self::UnknownKind(kind) => write!(f, "unknown frame kind {kind:#04x}"),
            Self::PayloadTooLarge { size, max } => {
                write!(f, "payload too large ({size} bytes, max {max})")
            }
            Self::ChecksumMismatch { expected, actual } => {
                write!(f, "checksum mismatch (expected {expected:#06x}, got {actual:#06x})")
            }
        }
    }
}

/// A rejected span at the front of the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Malformed {
    pub reason: MalformedReason,
    /// Bytes to drop before scanning again. Never more than one frame.
    pub discarded: usize,
}

impl fmt::Display for Malformed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} bytes discarded)", self.reason, self.discarded)
    }
}

/// Outcome of one decode attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// A complete, verified frame occupying the first `consumed` bytes.
    Frame { frame: Frame, consumed: usize },
    /// The buffer holds only the beginning of a frame.
    NeedMoreData,
    /// The front of the buffer is not a valid frame.
    Malformed(Malformed),
}

impl Decoded {
    /// Bytes the caller should drop from the front of the buffer.
    pub fn consumed(&self) -> usize {
        match self {
            Decoded::Frame { consumed, .. } => *consumed,
            Decoded::NeedMoreData => 0,
            Decoded::Malformed(malformed) => malformed.discarded,
        }
    }
}

/// Decode one frame from the front of `src`.
///
/// Pure: never mutates the buffer. The caller advances by
/// [`Decoded::consumed`] and calls again until `NeedMoreData`.
pub fn decode_frame(src: &[u8], max_payload: usize) -> Decoded {
    let start = next_sync(src, 0);
    if start > 0 {
        return malformed(MalformedReason::Garbage, start);
    }

    if src.len() < HEADER_SIZE {
        return Decoded::NeedMoreData;
    }

    let Some(kind) = FrameKind::from_byte(src[2]) else {
        return malformed(MalformedReason::UnknownKind(src[2]), next_sync(src, 1));
    };
    let key = u16::from_le_bytes([src[3], src[4]]);
    let payload_len = u16::from_le_bytes([src[5], src[6]]) as usize;

    if payload_len > max_payload {
        return malformed(
            MalformedReason::PayloadTooLarge {
                size: payload_len,
                max: max_payload,
            },
            next_sync(src, 1),
        );
    }

    let body_end = HEADER_SIZE + payload_len;
    let total = body_end + CHECKSUM_SIZE;
    if src.len() < total {
        return Decoded::NeedMoreData;
    }

    let expected = checksum(&src[MAGIC.len()..body_end]);
    let actual = u16::from_le_bytes([src[body_end], src[body_end + 1]]);
    if expected != actual {
        // Do not trust a corrupted length past the next magic.
        let discarded = find_magic(&src[..total], 1).unwrap_or(total);
        return malformed(
            MalformedReason::ChecksumMismatch { expected, actual },
            discarded,
        );
    }

    Decoded::Frame {
        frame: Frame {
            kind,
            key,
            payload: Bytes::copy_from_slice(&src[HEADER_SIZE..body_end]),
        },
        consumed: total,
    }
}

fn malformed(reason: MalformedReason, discarded: usize) -> Decoded {
    Decoded::Malformed(Malformed { reason, discarded })
}

/// Index of the first complete magic at or after `from`.
fn find_magic(src: &[u8], from: usize) -> Option<usize> {
    (from..src.len().saturating_sub(1)).find(|&i| src[i] == MAGIC[0] && src[i + 1] == MAGIC[1])
}

/// Index of the first complete magic at or after `from`, or of a lone first
/// magic byte at the very end of the buffer; `src.len()` when neither exists.
fn next_sync(src: &[u8], from: usize) -> usize {
    if let Some(index) = find_magic(src, from) {
        return index;
    }
    match src.last() {
        Some(&last) if last == MAGIC[0] && src.len() - 1 >= from => src.len() - 1,
        _ => src.len(),
    }
}

/// 16-bit wrapping sum of big-endian byte pairs; a trailing odd byte is XOR-ed in.
pub fn checksum(data: &[u8]) -> u16 {
    let mut chunks = data.chunks_exact(2);
    let mut sum = chunks
        .by_ref()
        .fold(0u16, |sum, pair| sum.wrapping_add(u16::from_be_bytes([pair[0], pair[1]])));
    if let [odd] = chunks.remainder() {
        sum ^= u16::from(*odd);
    }
    sum
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 4 KiB.
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}
