use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

use crate::codec::{decode_frame, encode_frame, Decoded, Frame, FrameConfig, Malformed};
use crate::error::FrameError;

/// `tokio_util` codec over the rmlink wire format.
///
/// Malformed spans are yielded as `Ok(Err(Malformed))` items after their
/// bytes are discarded, so one corrupt frame never ends the stream.
#[derive(Debug, Clone, Default)]
pub struct FrameCodec {
    config: FrameConfig,
}

impl FrameCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FrameConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl Decoder for FrameCodec {
    type Item = Result<Frame, Malformed>;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let decoded = decode_frame(src, self.config.max_payload_size);
        src.advance(decoded.consumed());
        match decoded {
            Decoded::Frame { frame, consumed } => {
                trace!(kind = frame.kind.name(), key = frame.key, consumed, "decoded frame");
                Ok(Some(Ok(frame)))
            }
            Decoded::NeedMoreData => Ok(None),
            Decoded::Malformed(malformed) => Ok(Some(Err(malformed))),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(item) => Ok(Some(item)),
            None if src.is_empty() => Ok(None),
            None => Err(FrameError::ConnectionClosed),
        }
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = FrameError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if frame.payload.len() > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: frame.payload.len(),
                max: self.config.max_payload_size,
            });
        }
        encode_frame(&frame, dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::MalformedReason;
    use futures_util::{SinkExt, StreamExt};
    use tokio::io::AsyncWriteExt;
    use tokio_util::codec::{FramedRead, FramedWrite};

    #[tokio::test]
    async fn test_stream_survives_malformed_frame() {
        let (client, server) = tokio::io::duplex(1024);
        let mut writer = FramedWrite::new(client, FrameCodec::new());
        let mut reader = FramedRead::new(server, FrameCodec::new());

        writer.send(Frame::reply(1, "ok")).await.unwrap();
        writer.get_mut().write_all(b"\xA5\x5A\x09junk").await.unwrap();
        writer.send(Frame::push(2, "0.1 0.2")).await.unwrap();
        drop(writer);

        let first = reader.next().await.unwrap().unwrap();
        assert_eq!(first, Ok(Frame::reply(1, "ok")));

        let second = reader.next().await.unwrap().unwrap().unwrap_err();
        assert_eq!(second.reason, MalformedReason::UnknownKind(0x09));

        assert_eq!(second.discarded, 7);

        let third = reader.next().await.unwrap().unwrap();
        assert_eq!(third, Ok(Frame::push(2, "0.1 0.2")));

        assert!(reader.next().await.is_none());
    }

    #[tokio::test]
    async fn test_partial_frame_at_eof_is_connection_closed() {
        let (mut client, server) = tokio::io::duplex(64);
        let mut reader = FramedRead::new(server, FrameCodec::new());

        client.write_all(&[0xA5, 0x5A, 0x02, 0x01]).await.unwrap();
        drop(client);

        let err = reader.next().await.unwrap().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn test_encoder_enforces_configured_limit() {
        let mut codec = FrameCodec::with_config(FrameConfig {
            max_payload_size: 4,
        });
        let mut buf = BytesMut::new();
        let err = codec
            .encode(Frame::command(1, "robot mode free"), &mut buf)
            .unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { size: 15, max: 4 }));
        assert!(buf.is_empty());
    }
}
