//! Snapshot broadcast (§4.8): a full snapshot every `snapshot_cadence`
//! ticks, sparse deltas against the last full snapshot in between.

use venture_shared::protocol::Message;
use venture_shared::snapshot::{capture_snapshot, diff_snapshot, WorldSnapshot};

use crate::state::ServerState;

pub struct BroadcastCadence {
    cadence_ticks: u32,
    ticks_since_full: u32,
    last_full: Option<WorldSnapshot>,
}

impl BroadcastCadence {
    pub fn new(cadence_ticks: u32) -> Self {
        Self {
            cadence_ticks: cadence_ticks.max(1),
            ticks_since_full: 0,
            last_full: None,
        }
    }

    /// Builds this tick's outbound message: a full snapshot on the cadence
    /// boundary (and always for the very first tick, since there is
    /// nothing yet to diff against), a delta otherwise.
    pub fn next_message(&mut self, state: &ServerState, timestamp_ms: u64) -> Message {
        let current = capture_snapshot(&state.world, timestamp_ms);

        let due_for_full = self.last_full.is_none() || self.ticks_since_full >= self.cadence_ticks;
        let message = if due_for_full {
            self.ticks_since_full = 0;
            self.last_full = Some(current.clone());
            Message::WorldSnapshotFull(current)
        } else {
            self.ticks_since_full += 1;
            let base = self.last_full.as_ref().expect("checked above");
            Message::WorldSnapshotDelta(diff_snapshot(base, &current))
        };
        message
    }
}

/// Publishes `message` to every connected client's snapshot slot (§4.8
/// "non-blocking; if a client's channel is full, drop the oldest snapshot
/// for that client"). A `watch` channel holds only the most recent value,
/// so a write task that hasn't caught up simply skips straight to this
/// tick's snapshot instead of working through a backlog -- there is no
/// blocking send in this path, so one slow client can never stall the tick
/// loop. `send` only errors once every receiver (the client's write task)
/// has dropped, which a connection in the middle of tearing down already
/// implies; the error is expected there, not logged as a fault.
pub fn broadcast(state: &ServerState, message: Message) {
    for client in state.clients.values() {
        let _ = client.snapshots.send(Some(message.clone()));
    }
}
