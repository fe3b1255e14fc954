//! Client-side prediction & server reconciliation (§4.6).
//!
//! The client predicts its own entity's movement locally the instant input
//! is produced, then reconciles against the authoritative position the
//! server reports: replay every input the server hasn't acked yet on top of
//! the authoritative state, using the exact same [`MovementSystem::integrate`]
//! the server runs, so predicted and replayed motion are bit-for-bit
//! identical given the same inputs.

use std::collections::VecDeque;

use venture_shared::components::{Direction, Position, Velocity};
use venture_shared::protocol::InputFrame;
use venture_shared::systems::MovementSystem;
use venture_shared::types::InputSeq;

/// How many unacked inputs the client is willing to buffer before dropping
/// the oldest -- bounds memory if the connection to the server stalls.
pub const DEFAULT_INPUT_BUFFER_CAPACITY: usize = 256;

/// If the predicted and reconciled positions diverge by more than this many
/// world units, snap instantly instead of blending (§4.6 "divergence
/// threshold").
pub const DEFAULT_DIVERGENCE_THRESHOLD: f64 = 2.0;

/// Blend rate applied per tick while under the divergence threshold: the
/// fraction of the remaining gap closed each tick.
pub const DEFAULT_BLEND_RATE: f64 = 0.2;

#[derive(Debug, Clone, Copy)]
struct BufferedInput {
    seq: InputSeq,
    input: InputFrame,
}

/// The locally predicted state of the player's own entity, plus the
/// in-flight input history needed to replay on reconciliation.
pub struct PredictedPlayer {
    pub position: Position,
    pub velocity: Velocity,
    pub facing: Direction,
    buffer: VecDeque<BufferedInput>,
    capacity: usize,
    divergence_threshold: f64,
    blend_rate: f64,
    /// Set while a hard-snap/blend correction is being applied, so the
    /// caller can tell prediction is mid-reconciliation (e.g. to suppress
    /// jitter-sensitive camera logic).
    pub reconciling: bool,
}

impl PredictedPlayer {
    pub fn new(position: Position, velocity: Velocity) -> Self {
        Self {
            position,
            velocity,
            facing: Direction::default(),
            buffer: VecDeque::with_capacity(DEFAULT_INPUT_BUFFER_CAPACITY),
            capacity: DEFAULT_INPUT_BUFFER_CAPACITY,
            divergence_threshold: DEFAULT_DIVERGENCE_THRESHOLD,
            blend_rate: DEFAULT_BLEND_RATE,
            reconciling: false,
        }
    }

    /// Overrides the buffer capacity and divergence tuning, e.g. from
    /// process configuration instead of the module defaults.
    pub fn with_tuning(mut self, capacity: usize, divergence_threshold: f64) -> Self {
        self.capacity = capacity.max(1);
        self.divergence_threshold = divergence_threshold;
        while self.buffer.len() > self.capacity {
            self.buffer.pop_front();
        }
        self
    }

    /// Applies `input` immediately to the local prediction and records it
    /// for later replay, evicting the oldest unacked input if the buffer is
    /// full (a stalled connection should degrade, not grow unbounded).
    pub fn predict(&mut self, seq: InputSeq, input: InputFrame, dt: f64) {
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(BufferedInput { seq, input });
        self.step(input, dt);
    }

    fn step(&mut self, input: InputFrame, dt: f64) {
        let speed_cap = self.velocity.speed_cap;
        self.velocity.vx = input.move_x as f64 * speed_cap;
        self.velocity.vy = input.move_y as f64 * speed_cap;
        MovementSystem::integrate(&mut self.position, &mut self.velocity, dt);
        self.facing = MovementSystem::derive_facing(&self.velocity, self.facing);
    }

    /// Reconciles against an authoritative `(position, velocity)` the
    /// server reported as of `last_acked_seq`: drops every input at or
    /// below that sequence from the buffer, replays the rest on top of the
    /// authoritative state, then blends (or hard-snaps) the client's
    /// visible position toward the replay result.
    pub fn reconcile(&mut self, server_position: Position, server_velocity: Velocity, last_acked_seq: InputSeq, dt: f64) {
        while let Some(front) = self.buffer.front() {
            if venture_shared::sequence::sequence_greater_than(last_acked_seq, front.seq) || last_acked_seq == front.seq {
                self.buffer.pop_front();
            } else {
                break;
            }
        }

        let mut replayed_position = server_position;
        let mut replayed_velocity = server_velocity;
        for buffered in self.buffer.iter() {
            let speed_cap = replayed_velocity.speed_cap;
            replayed_velocity.vx = buffered.input.move_x as f64 * speed_cap;
            replayed_velocity.vy = buffered.input.move_y as f64 * speed_cap;
            MovementSystem::integrate(&mut replayed_position, &mut replayed_velocity, dt);
        }

        let dx = replayed_position.x - self.position.x;
        let dy = replayed_position.y - self.position.y;
        let divergence = (dx * dx + dy * dy).sqrt();

        if divergence > self.divergence_threshold {
            self.position = replayed_position;
            self.reconciling = false;
        } else if divergence > f64::EPSILON {
            self.position = Position::new(
                self.position.x + dx * self.blend_rate,
                self.position.y + dy * self.blend_rate,
            );
            self.reconciling = true;
        } else {
            self.reconciling = false;
        }
        self.velocity = replayed_velocity;
    }

    pub fn pending_input_count(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(move_x: f32, move_y: f32, seq_ts: u64) -> InputFrame {
        InputFrame {
            move_x,
            move_y,
            action_bitfield: 0,
            aim_angle: 0.0,
            client_timestamp_ms: seq_ts,
        }
    }

    #[test]
    fn predicts_movement_immediately() {
        let mut player = PredictedPlayer::new(Position::new(0.0, 0.0), Velocity::new(0.0, 0.0, 0.0, 10.0));
        player.predict(1, input(1.0, 0.0, 0), 1.0 / 30.0);
        assert!(player.position.x > 0.0);
        assert_eq!(player.pending_input_count(), 1);
    }

    #[test]
    fn reconcile_drops_acked_inputs_and_replays_the_rest() {
        let mut player = PredictedPlayer::new(Position::new(0.0, 0.0), Velocity::new(0.0, 0.0, 0.0, 10.0));
        let dt = 1.0 / 30.0;
        player.predict(1, input(1.0, 0.0, 0), dt);
        player.predict(2, input(1.0, 0.0, 0), dt);
        player.predict(3, input(1.0, 0.0, 0), dt);

        // Server acked seq 1 and reports the exact state prediction produced
        // for it: replaying 2 and 3 on top should match current prediction
        // almost exactly (small divergence blends rather than snaps).
        let server_position = Position::new(10.0 * dt, 0.0);
        let server_velocity = Velocity::new(10.0, 0.0, 0.0, 10.0);
        player.reconcile(server_position, server_velocity, 1, dt);

        assert_eq!(player.pending_input_count(), 2);
    }

    #[test]
    fn large_divergence_hard_snaps() {
        let mut player = PredictedPlayer::new(Position::new(0.0, 0.0), Velocity::new(0.0, 0.0, 0.0, 10.0));
        let dt = 1.0 / 30.0;
        player.predict(1, input(1.0, 0.0, 0), dt);

        // Server reports a wildly different authoritative position (e.g.
        // after a teleport/respawn) -- should snap, not blend.
        player.reconcile(Position::new(500.0, 500.0), Velocity::new(0.0, 0.0, 0.0, 10.0), 0, dt);
        assert_eq!(player.position, Position::new(500.0, 500.0));
        assert!(!player.reconciling);
    }
}
