//! Wire protocol (§4.5): message types, length-prefixed framing, and the
//! error taxonomy shared by both the server and client transport tasks.

pub mod error;
pub mod frame;
pub mod message;

pub use error::{ConnectionError, DecodeError, EncodeError, MAX_FRAME_BYTES};
pub use frame::{decode_message, encode_message, read_frame, write_frame};
pub use message::{
    ErrorCode, HandshakeAccepted, HandshakeRejectReason, InputFrame, Message, MessageKind,
    PROTOCOL_VERSION,
};
