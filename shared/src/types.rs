//! Primitive ID and time types shared by every subsystem.

/// Opaque 64-bit entity identifier (§3 "Entity").
///
/// Server-assigned entities use the low range; purely client-local entities
/// (particle emitters, UI helpers) are assigned out of [`LOCAL_ENTITY_BASE`]
/// so the two spaces can never collide.
pub type EntityId = u64;

/// Entity IDs at or above this value are client-local and never sent over
/// the wire.
pub const LOCAL_ENTITY_BASE: EntityId = 1 << 63;

/// Returns whether an entity id belongs to the client-local range.
pub fn is_local_entity(id: EntityId) -> bool {
    id >= LOCAL_ENTITY_BASE
}

/// One fixed-rate simulation step (glossary: "Tick").
pub type Tick = u64;

/// Per-client monotonic input sequence number (glossary: "Sequence number").
/// Stored as `u16` and compared with wrapping arithmetic (see
/// [`crate::sequence`]) so wraparound behaves correctly across very long
/// sessions.
pub type InputSeq = u16;

/// Server-assigned identifier for a connected player/client.
pub type PlayerId = u64;

/// Team identifier used for friend/foe checks (§3 Team component).
pub type TeamId = u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostRole {
    Server,
    Client,
}
