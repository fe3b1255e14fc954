//! Internal channel events flowing from connection tasks to the tick loop.
//! Kept distinct from `venture_shared::events::GameEvent`, which is
//! gameplay-internal and never crosses a task boundary.

use tokio::sync::{mpsc, oneshot, watch};

use venture_shared::protocol::{HandshakeRejectReason, InputFrame, Message};
use venture_shared::types::{EntityId, InputSeq, PlayerId};

/// What the tick loop hands back to a connection task once a client has
/// been registered: the assigned player id plus the entity that represents
/// it in the world, so the client can tell which entity in later snapshots
/// is its own.
pub struct Accepted {
    pub player_id: PlayerId,
    pub entity: EntityId,
}

pub enum ServerEvent {
    Connect {
        player_name: String,
        /// Reliable, ordered control messages (handshake-era errors,
        /// graceful `Disconnect`): backpressure here is fine since these
        /// are rare and never produced at tick cadence.
        outbound: mpsc::Sender<Message>,
        /// Latest-value-wins channel for per-tick `WorldSnapshot`
        /// broadcasts (§4.8 "non-blocking; if full, drop the oldest
        /// snapshot for that client"): a `watch` only ever holds the most
        /// recent value, so an unread snapshot is implicitly replaced
        /// rather than queued, and the tick loop never blocks on a slow
        /// reader.
        snapshots: watch::Sender<Option<Message>>,
        ack: oneshot::Sender<Result<Accepted, HandshakeRejectReason>>,
    },
    Input {
        player_id: PlayerId,
        seq: InputSeq,
        input: InputFrame,
    },
    Disconnect {
        player_id: PlayerId,
    },
}
