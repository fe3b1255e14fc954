//! Interpolation of remote (non-predicted) entities (§4.6): rendered
//! position lags the latest authoritative snapshot by one interpolation
//! window so motion stays smooth despite discrete network updates.

use std::collections::HashMap;

use venture_shared::components::Position;
use venture_shared::snapshot::WorldSnapshot;
use venture_shared::types::EntityId;

/// How far behind the latest received snapshot's timestamp rendering lags,
/// in milliseconds -- enough buffer to almost always have two real
/// snapshots bracketing the render timestamp despite jitter.
pub const DEFAULT_INTERP_DELAY_MS: u64 = 100;

pub struct InterpolationBuffer {
    history: Vec<WorldSnapshot>,
    max_history: usize,
}

impl InterpolationBuffer {
    pub fn new() -> Self {
        Self {
            history: Vec::new(),
            max_history: 16,
        }
    }

    pub fn push(&mut self, snapshot: WorldSnapshot) {
        self.history.push(snapshot);
        if self.history.len() > self.max_history {
            self.history.remove(0);
        }
    }

    pub fn latest_timestamp_ms(&self) -> Option<u64> {
        self.history.last().map(|s| s.timestamp_ms)
    }

    /// Linearly interpolates every remote entity's position at
    /// `render_timestamp_ms` (typically the latest received timestamp minus
    /// [`DEFAULT_INTERP_DELAY_MS`]), between the two snapshots bracketing
    /// it. Entities present in only one of the two snapshots (just
    /// spawned/despawned) render at their single known position rather than
    /// being skipped. Returns an empty map if fewer than two snapshots have
    /// been received yet.
    pub fn interpolated_positions(&self, local_entity: EntityId, render_timestamp_ms: u64) -> HashMap<EntityId, Position> {
        let mut out = HashMap::new();
        if self.history.len() < 2 {
            if let Some(only) = self.history.last() {
                for (&id, state) in &only.entities {
                    if id != local_entity {
                        out.insert(id, state.position);
                    }
                }
            }
            return out;
        }

        let (from, to) = self.bracket(render_timestamp_ms);
        let span = (to.timestamp_ms.saturating_sub(from.timestamp_ms)).max(1) as f64;
        let elapsed = render_timestamp_ms.saturating_sub(from.timestamp_ms) as f64;
        let t = (elapsed / span).clamp(0.0, 1.0);

        for (&id, to_state) in &to.entities {
            if id == local_entity {
                continue;
            }
            match from.entities.get(&id) {
                Some(from_state) => {
                    let x = from_state.position.x + (to_state.position.x - from_state.position.x) * t;
                    let y = from_state.position.y + (to_state.position.y - from_state.position.y) * t;
                    out.insert(id, Position::new(x, y));
                }
                None => {
                    out.insert(id, to_state.position);
                }
            }
        }
        for (&id, from_state) in &from.entities {
            if id != local_entity && !to.entities.contains_key(&id) {
                out.insert(id, from_state.position);
            }
        }
        out
    }

    /// Finds the pair of consecutive snapshots whose timestamps bracket
    /// `target_ms`, clamping to the oldest/newest pair at either end of the
    /// retained history.
    fn bracket(&self, target_ms: u64) -> (&WorldSnapshot, &WorldSnapshot) {
        for window in self.history.windows(2) {
            let (a, b) = (&window[0], &window[1]);
            if target_ms <= b.timestamp_ms {
                return (a, b);
            }
        }
        let len = self.history.len();
        (&self.history[len - 2], &self.history[len - 1])
    }
}

impl Default for InterpolationBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use venture_shared::components::{Direction, Health, Velocity};
    use venture_shared::snapshot::EntityState;

    fn state_at(x: f64) -> EntityState {
        EntityState {
            position: Position::new(x, 0.0),
            velocity: Velocity::new(0.0, 0.0, 0.0, 5.0),
            health: Some(Health::new(10.0)),
            facing: Some(Direction::South),
            acked_seq: None,
        }
    }

    #[test]
    fn interpolates_between_two_snapshots() {
        let mut buffer = InterpolationBuffer::new();
        for tick in 0..5u64 {
            let mut snap = WorldSnapshot::new(tick, tick * 100);
            snap.entities.insert(2, state_at(tick as f64 * 10.0));
            buffer.push(snap);
        }
        let positions = buffer.interpolated_positions(1, 250);
        let pos = positions.get(&2).unwrap();
        assert!((pos.x - 25.0).abs() < 1e-9);
    }

    #[test]
    fn empty_history_yields_no_positions() {
        let buffer = InterpolationBuffer::new();
        assert!(buffer.interpolated_positions(1, 0).is_empty());
    }
}
