//! Length-prefixed framing: `[u32 length][u8 type][payload]`, where
//! `length` counts the type byte plus the payload (§4.5). Encoding uses
//! `bincode` for the payload and a `MessageKind` discriminant, independent
//! of serde's own enum tag, for the type byte.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::error::{DecodeError, EncodeError, MAX_FRAME_BYTES};
use super::message::{Message, MessageKind};

/// Encodes a message into a full frame (length prefix included), ready to
/// write to a socket.
pub fn encode_message(message: &Message) -> Result<Vec<u8>, EncodeError> {
    let payload = bincode::serialize(message)?;
    let body_len = payload
        .len()
        .checked_add(1)
        .ok_or(EncodeError::PayloadTooLarge { size: payload.len() })?;
    if body_len > MAX_FRAME_BYTES as usize {
        return Err(EncodeError::PayloadTooLarge { size: payload.len() });
    }

    let mut frame = Vec::with_capacity(4 + body_len);
    frame.extend_from_slice(&(body_len as u32).to_be_bytes());
    frame.push(MessageKind::of(message) as u8);
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Decodes a single frame's body (everything after the length prefix has
/// already been read off the wire).
pub fn decode_message(body: &[u8]) -> Result<Message, DecodeError> {
    let (&kind_byte, payload) = body.split_first().ok_or(DecodeError::EmptyFrame)?;
    let kind = MessageKind::from_u8(kind_byte).ok_or(DecodeError::UnknownMessageType(kind_byte))?;
    let message: Message = bincode::deserialize(payload)?;
    debug_assert_eq!(MessageKind::of(&message), kind, "decoded message kind mismatch");
    Ok(message)
}

/// Writes a message as one length-prefixed frame.
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, message: &Message) -> Result<(), super::error::ConnectionError> {
    let frame = encode_message(message)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one length-prefixed frame and decodes it. Returns
/// `Err(ConnectionError::Closed)` if the peer closed the stream cleanly
/// before any bytes of a new frame arrived.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Message, super::error::ConnectionError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(super::error::ConnectionError::Closed)
        }
        Err(e) => return Err(e.into()),
    }
    let body_len = u32::from_be_bytes(len_buf);
    if body_len == 0 {
        return Err(DecodeError::EmptyFrame.into());
    }
    if body_len > MAX_FRAME_BYTES {
        return Err(DecodeError::FrameTooLarge { size: body_len }.into());
    }

    let mut body = vec![0u8; body_len as usize];
    reader.read_exact(&mut body).await?;
    Ok(decode_message(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::message::InputFrame;

    #[test]
    fn roundtrips_through_encode_decode() {
        let message = Message::PlayerInput {
            seq: 42,
            input: InputFrame {
                move_x: 1.0,
                move_y: 0.0,
                action_bitfield: 0b101,
                aim_angle: 0.75,
                client_timestamp_ms: 123456,
            },
        };
        let frame = encode_message(&message).unwrap();
        let body = &frame[4..];
        let decoded = decode_message(body).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn rejects_unknown_type_byte() {
        let body = [255u8, 0, 0];
        assert!(matches!(decode_message(&body), Err(DecodeError::UnknownMessageType(255))));
    }

    #[test]
    fn rejects_empty_frame() {
        assert!(matches!(decode_message(&[]), Err(DecodeError::EmptyFrame)));
    }

    #[tokio::test]
    async fn async_roundtrip_over_a_pipe() {
        let (mut client, mut server) = tokio::io::duplex(4096);
        let message = Message::Disconnect {
            reason: "bye".into(),
        };
        write_frame(&mut client, &message).await.unwrap();
        let received = read_frame(&mut server).await.unwrap();
        assert_eq!(received, message);
    }

    #[tokio::test]
    async fn read_frame_reports_closed_on_clean_eof() {
        let (client, mut server) = tokio::io::duplex(4096);
        drop(client);
        let result = read_frame(&mut server).await;
        assert!(matches!(result, Err(super::super::error::ConnectionError::Closed)));
    }
}
