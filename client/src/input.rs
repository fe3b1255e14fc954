//! The input source contract (§6): the core consumes per-frame movement and
//! action intent but never captures keyboard/mouse/touch itself -- that
//! capture is an external collaborator. This module only defines the
//! boundary and a couple of trivial sources useful for headless testing and
//! as a default when no real capture layer is wired in.

use venture_shared::protocol::InputFrame;

/// Produces one [`InputFrame`] per local simulation tick.
pub trait InputSource: Send {
    fn sample(&mut self, timestamp_ms: u64) -> InputFrame;
}

/// Always reports "no input" -- useful as a safe default and in tests that
/// only care about network/prediction plumbing, not movement.
pub struct NullInputSource;

impl InputSource for NullInputSource {
    fn sample(&mut self, timestamp_ms: u64) -> InputFrame {
        InputFrame {
            move_x: 0.0,
            move_y: 0.0,
            action_bitfield: 0,
            aim_angle: 0.0,
            client_timestamp_ms: timestamp_ms,
        }
    }
}

/// Replays a fixed, pre-recorded sequence of frames, holding the last one
/// once exhausted. Useful for integration tests and demos that need
/// deterministic input without a real capture device.
pub struct ScriptedInputSource {
    frames: Vec<InputFrame>,
    cursor: usize,
}

impl ScriptedInputSource {
    pub fn new(frames: Vec<InputFrame>) -> Self {
        Self { frames, cursor: 0 }
    }
}

impl InputSource for ScriptedInputSource {
    fn sample(&mut self, timestamp_ms: u64) -> InputFrame {
        if self.frames.is_empty() {
            return InputFrame {
                move_x: 0.0,
                move_y: 0.0,
                action_bitfield: 0,
                aim_angle: 0.0,
                client_timestamp_ms: timestamp_ms,
            };
        }
        let mut frame = self.frames[self.cursor.min(self.frames.len() - 1)];
        frame.client_timestamp_ms = timestamp_ms;
        if self.cursor + 1 < self.frames.len() {
            self.cursor += 1;
        }
        frame
    }
}
