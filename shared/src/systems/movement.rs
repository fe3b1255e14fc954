//! Movement system (§4.4): integrates position from velocity, applies
//! friction, and derives a discrete facing direction.

use crate::components::{Direction, Facing, Position, Velocity};
use crate::ecs::world::System;
use crate::ecs::World;

/// Speeds below this are treated as "stationary" for facing purposes,
/// avoiding direction jitter from floating-point noise (§4.4 "jitter
/// threshold").
const FACING_EPSILON: f64 = 0.05;

pub struct MovementSystem;

impl MovementSystem {
    /// Pure function so the client's prediction replay (§4.6) can call the
    /// exact same logic the server uses, tick for tick.
    pub fn integrate(position: &mut Position, velocity: &mut Velocity, dt: f64) {
        position.x += velocity.vx * dt;
        position.y += velocity.vy * dt;
        velocity.vx *= 1.0 - velocity.friction * dt;
        velocity.vy *= 1.0 - velocity.friction * dt;
        velocity.clamp_to_speed_cap();
    }

    /// Horizontal priority on diagonals (§4.4): when `|vx|` and `|vy|` are
    /// both above the jitter threshold, the horizontal component wins.
    pub fn derive_facing(velocity: &Velocity, previous: Direction) -> Direction {
        let speed = velocity.magnitude();
        if speed < FACING_EPSILON {
            return previous;
        }
        if velocity.vx.abs() >= velocity.vy.abs() {
            if velocity.vx >= 0.0 {
                Direction::East
            } else {
                Direction::West
            }
        } else if velocity.vy >= 0.0 {
            Direction::South
        } else {
            Direction::North
        }
    }
}

impl System for MovementSystem {
    fn name(&self) -> &'static str {
        "movement"
    }

    fn update(&mut self, world: &mut World, dt: f64) {
        let ids: Vec<_> = world.get_entities().clone();
        for id in ids {
            // Entities mid action-state (attack/hit/death/cast) keep their
            // last facing; that state lives on the Ai/animation layer which
            // this core does not own, so only stationary-speed suppression
            // is handled here (§4.4).
            let has_velocity = world.has_component(id, Velocity::TAG);
            let has_position = world.has_component(id, Position::TAG);
            if !has_velocity || !has_position {
                continue;
            }

            let velocity_snapshot = *world.get_component::<Velocity>(id).unwrap();
            let mut position = *world.get_component::<Position>(id).unwrap();
            let mut velocity = velocity_snapshot;
            Self::integrate(&mut position, &mut velocity, dt);

            let previous_facing = world
                .get_component::<Facing>(id)
                .map(|f| f.direction)
                .unwrap_or_default();
            let new_facing = Self::derive_facing(&velocity, previous_facing);

            if let Some(p) = world.get_component_mut::<Position>(id) {
                *p = position;
            }
            if let Some(v) = world.get_component_mut::<Velocity>(id) {
                *v = velocity;
            }
            if world.has_component(id, Facing::TAG) {
                if let Some(f) = world.get_component_mut::<Facing>(id) {
                    f.direction = new_facing;
                }
            } else {
                let _ = world.add_component(id, Facing { direction: new_facing });
            }
        }
    }
}
