//! AI system (§4.4): a finite-state machine evaluated at a fixed decision
//! interval (~0.5s) to bound per-entity cost, rather than every tick.

use crate::components::{Ai, AiState, Dead, Health, Position, Team};
use crate::ecs::world::System;
use crate::ecs::World;
use crate::spatial::Quadtree;
use crate::types::EntityId;

fn distance(a: Position, b: Position) -> f64 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

/// Resolves `ai.target` to a live entity id, clearing it if the referenced
/// entity no longer exists or is dead (§9 "validate on dereference that the
/// referenced entity still exists and is alive").
fn resolve_target(world: &World, ai: &mut Ai) -> Option<EntityId> {
    let target = ai.target?;
    if !world.contains_entity(target) || world.has_component(target, Dead::TAG) {
        ai.target = None;
        return None;
    }
    Some(target)
}

fn find_nearest_enemy(
    world: &World,
    quadtree: &Quadtree,
    self_id: EntityId,
    self_pos: Position,
    self_team: Team,
    radius: f64,
) -> Option<EntityId> {
    let candidates = quadtree.query_radius(self_pos.x, self_pos.y, radius);
    candidates
        .into_iter()
        .filter(|&id| id != self_id)
        .filter(|&id| !world.has_component(id, Dead::TAG))
        .filter_map(|id| {
            let pos = world.get_component::<Position>(id)?;
            let team = world.get_component::<Team>(id)?;
            if team.is_friendly(&self_team) {
                return None;
            }
            Some((id, distance(self_pos, *pos)))
        })
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
        .map(|(id, _)| id)
}

pub struct AiSystem;

impl AiSystem {
    /// Decides the next state transition for one entity. Pure function over
    /// its inputs so it is independently testable without a full `World`.
    #[allow(clippy::too_many_arguments)]
    pub fn decide(
        ai: &Ai,
        self_pos: Position,
        self_health_fraction: f64,
        target_pos: Option<Position>,
        target_alive: bool,
    ) -> AiState {
        let distance_to_spawn = distance(self_pos, Position::new(ai.spawn_x, ai.spawn_y));

        if self_health_fraction < ai.flee_health_fraction && ai.state != AiState::Return {
            return AiState::Flee;
        }

        if distance_to_spawn > ai.max_chase_distance {
            return AiState::Return;
        }

        match (target_pos, target_alive) {
            (Some(target), true) => {
                let d = distance(self_pos, target);
                if d <= ai.attack_range {
                    AiState::Attack
                } else if d <= ai.detection_radius || ai.state == AiState::Chase || ai.state == AiState::Attack {
                    AiState::Chase
                } else {
                    AiState::Detect
                }
            }
            _ => {
                if ai.state == AiState::Return && distance_to_spawn > 0.5 {
                    AiState::Return
                } else {
                    AiState::Idle
                }
            }
        }
    }
}

impl System for AiSystem {
    fn name(&self) -> &'static str {
        "ai"
    }

    fn update(&mut self, world: &mut World, dt: f64) {
        // A fresh quadtree snapshot per AI pass keeps target resolution
        // consistent with collision's broad-phase cadence without this
        // system owning its own rebuild schedule (§4.4 "uses the spatial
        // index").
        let ids: Vec<EntityId> = world.get_entities().clone();
        let mut bounds_min = (f64::MAX, f64::MAX);
        let mut bounds_max = (f64::MIN, f64::MIN);
        let mut points = Vec::new();
        for &id in &ids {
            if let Some(p) = world.get_component::<Position>(id) {
                bounds_min.0 = bounds_min.0.min(p.x);
                bounds_min.1 = bounds_min.1.min(p.y);
                bounds_max.0 = bounds_max.0.max(p.x);
                bounds_max.1 = bounds_max.1.max(p.y);
                points.push((id, p.x, p.y));
            }
        }
        if points.is_empty() {
            return;
        }
        let bounds = crate::spatial::Bounds::new(
            bounds_min.0 - 1.0,
            bounds_min.1 - 1.0,
            bounds_max.0 + 1.0,
            bounds_max.1 + 1.0,
        );
        let mut quadtree = Quadtree::new(bounds);
        quadtree.rebuild(points.into_iter());

        for &id in &ids {
            if world.has_component(id, Dead::TAG) || !world.has_component(id, Ai::TAG) {
                continue;
            }

            let mut ai = match world.get_component::<Ai>(id) {
                Some(ai) => *ai,
                None => continue,
            };

            ai.time_since_decision += dt;
            if ai.time_since_decision < ai.decision_interval {
                if let Some(stored) = world.get_component_mut::<Ai>(id) {
                    stored.time_since_decision = ai.time_since_decision;
                }
                continue;
            }
            ai.time_since_decision = 0.0;

            let self_pos = match world.get_component::<Position>(id) {
                Some(p) => *p,
                None => continue,
            };
            let self_health_fraction = world
                .get_component::<Health>(id)
                .map(|h| h.fraction())
                .unwrap_or(1.0);
            let self_team = world.get_component::<Team>(id).copied();

            let _ = resolve_target(world, &mut ai);
            if ai.target.is_none() {
                if let Some(team) = self_team {
                    ai.target = find_nearest_enemy(world, &quadtree, id, self_pos, team, ai.detection_radius);
                }
            }

            let target_pos = ai.target.and_then(|t| world.get_component::<Position>(t).copied());
            let target_alive = ai.target.is_some();

            ai.state = Self::decide(&ai, self_pos, self_health_fraction, target_pos, target_alive);

            if let Some(stored) = world.get_component_mut::<Ai>(id) {
                *stored = ai;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ai() -> Ai {
        Ai::new(0.0, 0.0)
    }

    #[test]
    fn idle_to_detect_when_enemy_in_radius_but_not_attack_range() {
        let ai = ai();
        let state = AiSystem::decide(&ai, Position::new(0.0, 0.0), 1.0, Some(Position::new(3.0, 0.0)), true);
        assert_eq!(state, AiState::Detect);
    }

    #[test]
    fn chases_closer_target() {
        let mut ai = ai();
        ai.state = AiState::Chase;
        let state = AiSystem::decide(&ai, Position::new(0.0, 0.0), 1.0, Some(Position::new(3.0, 0.0)), true);
        assert_eq!(state, AiState::Chase);
    }

    #[test]
    fn attacks_in_range() {
        let ai = ai();
        let state = AiSystem::decide(&ai, Position::new(0.0, 0.0), 1.0, Some(Position::new(1.0, 0.0)), true);
        assert_eq!(state, AiState::Attack);
    }

    #[test]
    fn flees_under_threshold() {
        let ai = ai();
        let state = AiSystem::decide(&ai, Position::new(0.0, 0.0), 0.1, Some(Position::new(1.0, 0.0)), true);
        assert_eq!(state, AiState::Flee);
    }

    #[test]
    fn returns_when_too_far_from_spawn() {
        let ai = ai();
        let state = AiSystem::decide(&ai, Position::new(50.0, 0.0), 1.0, None, false);
        assert_eq!(state, AiState::Return);
    }

    #[test]
    fn idles_with_no_target_near_spawn() {
        let ai = ai();
        let state = AiSystem::decide(&ai, Position::new(0.1, 0.0), 1.0, None, false);
        assert_eq!(state, AiState::Idle);
    }
}
