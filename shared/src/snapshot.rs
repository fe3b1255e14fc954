//! World snapshots (§3, §4.8): immutable per-tick records used for network
//! broadcast, client-side interpolation, and server-side lag compensation.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::components::{Direction, Facing, Health, Network, Position, Velocity};
use crate::ecs::World;
use crate::types::{EntityId, InputSeq, Tick};

/// Builds a full snapshot from the live world: positions, velocities,
/// health, and facing for every entity that has at least a Position (§4.8
/// "build a WorldSnapshot from the current entity set").
pub fn capture_snapshot(world: &World, timestamp_ms: u64) -> WorldSnapshot {
    let mut snapshot = WorldSnapshot::new(world.tick(), timestamp_ms);
    for &id in world.get_entities().iter() {
        let position = match world.get_component::<Position>(id) {
            Some(p) => *p,
            None => continue,
        };
        let velocity = world
            .get_component::<Velocity>(id)
            .copied()
            .unwrap_or(Velocity::new(0.0, 0.0, 0.0, 0.0));
        let health = world.get_component::<Health>(id).copied();
        let facing = world.get_component::<Facing>(id).map(|f| f.direction);
        // The `Network` component is server-only and never otherwise leaves
        // the world, but its `last_acked_input_seq` is exactly the ack a
        // predicting client needs (§4.6 step 4) -- surfacing it here avoids
        // inventing a parallel out-of-band ack channel.
        let acked_seq = world.get_component::<Network>(id).map(|n| n.last_acked_input_seq);
        snapshot.entities.insert(
            id,
            EntityState {
                position,
                velocity,
                health,
                facing,
                acked_seq,
            },
        );
    }
    snapshot
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub position: Position,
    pub velocity: Velocity,
    pub health: Option<Health>,
    pub facing: Option<Direction>,
    /// Present only for the networked entity's own owner client (§4.6);
    /// `None` for every other entity in the snapshot.
    pub acked_seq: Option<InputSeq>,
}

/// Immutable record of world state at a tick (§3 "Snapshots").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tick: Tick,
    pub timestamp_ms: u64,
    pub entities: HashMap<EntityId, EntityState>,
}

impl WorldSnapshot {
    pub fn new(tick: Tick, timestamp_ms: u64) -> Self {
        Self {
            tick,
            timestamp_ms,
            entities: HashMap::new(),
        }
    }
}

/// Sparse delta versus a full snapshot: only entities whose state changed
/// since the reference full snapshot are listed (§4.8 "Optional delta
/// compression", §9 "implementation-defined, no wire compatibility
/// mandated").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDelta {
    pub tick: Tick,
    pub timestamp_ms: u64,
    pub base_tick: Tick,
    pub changed: HashMap<EntityId, EntityState>,
    pub removed: Vec<EntityId>,
}

/// Builds a delta against `base`, including only entities whose state
/// differs (exact `PartialEq`, which is appropriate here since both sides
/// run the identical deterministic simulation -- no epsilon tolerance is
/// needed for a same-process diff).
pub fn diff_snapshot(base: &WorldSnapshot, current: &WorldSnapshot) -> SnapshotDelta {
    let mut changed = HashMap::new();
    for (id, state) in &current.entities {
        match base.entities.get(id) {
            Some(prev) if prev == state => {}
            _ => {
                changed.insert(*id, *state);
            }
        }
    }
    let removed: Vec<EntityId> = base
        .entities
        .keys()
        .filter(|id| !current.entities.contains_key(id))
        .copied()
        .collect();

    SnapshotDelta {
        tick: current.tick,
        timestamp_ms: current.timestamp_ms,
        base_tick: base.tick,
        changed,
        removed,
    }
}

/// Applies a delta against a full snapshot, reconstructing the full state
/// the delta was computed against (client-side counterpart of
/// [`diff_snapshot`]).
pub fn apply_delta(base: &WorldSnapshot, delta: &SnapshotDelta) -> WorldSnapshot {
    let mut entities = base.entities.clone();
    for id in &delta.removed {
        entities.remove(id);
    }
    for (id, state) in &delta.changed {
        entities.insert(*id, *state);
    }
    WorldSnapshot {
        tick: delta.tick,
        timestamp_ms: delta.timestamp_ms,
        entities,
    }
}

/// Ring buffer of the last `N` tick-snapshots (default 60 ticks ~= 3s at
/// 60Hz). Used by lag compensation to rewind (§4.7) and by snapshot
/// broadcast as the source of full/delta frames (§4.8).
pub struct SnapshotRing {
    capacity: usize,
    buffer: VecDeque<WorldSnapshot>,
}

impl SnapshotRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            buffer: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, snapshot: WorldSnapshot) {
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(snapshot);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn latest(&self) -> Option<&WorldSnapshot> {
        self.buffer.back()
    }

    pub fn get_at_tick(&self, tick: Tick) -> Option<&WorldSnapshot> {
        self.buffer.iter().find(|s| s.tick == tick)
    }

    /// Returns the snapshot whose timestamp is closest to `target_ms`,
    /// clamped into the buffer's window (§4.7 step 2: "clamp into buffer
    /// window"). `None` only if the ring is empty.
    pub fn closest_to_timestamp(&self, target_ms: u64) -> Option<&WorldSnapshot> {
        self.buffer.iter().min_by_key(|s| {
            if s.timestamp_ms > target_ms {
                s.timestamp_ms - target_ms
            } else {
                target_ms - s.timestamp_ms
            }
        })
    }

    pub fn oldest_timestamp(&self) -> Option<u64> {
        self.buffer.front().map(|s| s.timestamp_ms)
    }

    pub fn newest_timestamp(&self) -> Option<u64> {
        self.buffer.back().map(|s| s.timestamp_ms)
    }
}
