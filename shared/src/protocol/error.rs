//! Protocol error taxonomy (§4.5), mirroring the encode/decode/connection
//! split of the networking stack this module's framing is grounded on.

use thiserror::Error;

/// Frames larger than this are rejected before the length-prefixed payload
/// is even read, bounding how much a malicious or corrupted peer can make
/// either side allocate.
pub const MAX_FRAME_BYTES: u32 = 4 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("failed to serialize message payload: {0}")]
    Serialize(#[from] bincode::Error),
    #[error("encoded payload ({size} bytes) exceeds the {MAX_FRAME_BYTES} byte frame limit")]
    PayloadTooLarge { size: usize },
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unknown message type byte {0}")]
    UnknownMessageType(u8),
    #[error("frame length {size} exceeds the {MAX_FRAME_BYTES} byte frame limit")]
    FrameTooLarge { size: u32 },
    #[error("frame declared 0 length, which cannot hold a type byte")]
    EmptyFrame,
    #[error("failed to deserialize message payload: {0}")]
    Deserialize(#[from] bincode::Error),
}

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("peer closed the connection")]
    Closed,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}
