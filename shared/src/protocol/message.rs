//! Wire message types (§4.5).

use serde::{Deserialize, Serialize};

use crate::procgen::Genre;
use crate::snapshot::{SnapshotDelta, WorldSnapshot};
use crate::types::{EntityId, InputSeq, PlayerId};

/// Current wire protocol version. Bumped whenever a message's shape changes
/// in a way that breaks compatibility; handshakes with a mismatched version
/// are rejected (§4.5, §6).
pub const PROTOCOL_VERSION: u16 = 1;

/// Movement input plus an action bitfield, matching the external Input
/// Source contract (§6): `move_x, move_y in [-1, 1]`, `action_bitfield`,
/// `aim_angle`, and the client's own clock reading for lag compensation
/// (§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputFrame {
    pub move_x: f32,
    pub move_y: f32,
    pub action_bitfield: u32,
    pub aim_angle: f32,
    pub client_timestamp_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandshakeRejectReason {
    ProtocolVersionMismatch { expected: u16, got: u16 },
    ServerFull { max_players: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    ProtocolVersionMismatch,
    ServerFull,
    OversizeMessage,
    MalformedMessage,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    /// C -> S: protocol version, player name.
    Handshake {
        protocol_version: u16,
        player_name: String,
    },
    /// S -> C: accepted/rejected, assigned player id, world seed, genre id.
    HandshakeAck {
        result: Result<HandshakeAccepted, HandshakeRejectReason>,
    },
    /// C -> S: sequence number, movement vector, action bitfield, client
    /// timestamp.
    PlayerInput { seq: InputSeq, input: InputFrame },
    /// S -> C: tick, timestamp, entity states (delta-compressible).
    WorldSnapshotFull(WorldSnapshot),
    WorldSnapshotDelta(SnapshotDelta),
    /// Either direction: graceful close.
    Disconnect { reason: String },
    /// S -> C: code + message.
    Error { code: ErrorCode, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandshakeAccepted {
    pub player_id: PlayerId,
    pub entity: EntityId,
    pub world_seed: u64,
    pub genre: Genre,
    pub tick_rate: u32,
}

/// `u8` discriminant used as the frame's type byte (§4.5 framing), kept
/// independent of `Message`'s derive order so reordering variants in
/// `Message` can never silently change the wire tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageKind {
    Handshake = 0,
    HandshakeAck = 1,
    PlayerInput = 2,
    WorldSnapshotFull = 3,
    WorldSnapshotDelta = 4,
    Disconnect = 5,
    Error = 6,
}

impl MessageKind {
    pub fn of(message: &Message) -> Self {
        match message {
            Message::Handshake { .. } => MessageKind::Handshake,
            Message::HandshakeAck { .. } => MessageKind::HandshakeAck,
            Message::PlayerInput { .. } => MessageKind::PlayerInput,
            Message::WorldSnapshotFull(_) => MessageKind::WorldSnapshotFull,
            Message::WorldSnapshotDelta(_) => MessageKind::WorldSnapshotDelta,
            Message::Disconnect { .. } => MessageKind::Disconnect,
            Message::Error { .. } => MessageKind::Error,
        }
    }

    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(MessageKind::Handshake),
            1 => Some(MessageKind::HandshakeAck),
            2 => Some(MessageKind::PlayerInput),
            3 => Some(MessageKind::WorldSnapshotFull),
            4 => Some(MessageKind::WorldSnapshotDelta),
            5 => Some(MessageKind::Disconnect),
            6 => Some(MessageKind::Error),
            _ => None,
        }
    }
}
