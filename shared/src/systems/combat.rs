//! Combat system (§4.4): range + team + facing-cone checks, damage
//! application, crits, and the death transition.
//!
//! Combat-on-entity is a terminal state machine: `Dead` is absorbing (§4.4).
//! This module exposes its damage math as free functions so the client's
//! deterministic replay path (§4.6) can reuse exactly the same formula.

use crate::components::{Dead, Direction, Facing, Health, Position, Stats, Team};
use crate::ecs::world::System;
use crate::ecs::World;
use crate::events::GameEvent;
use crate::rng::SeededRng;
use crate::types::EntityId;

/// Half-angle of the facing cone, in the four cardinal buckets used by
/// [`crate::components::Direction`] -- a target is in-cone if it falls
/// within the attacker's facing quadrant.
fn in_facing_cone(attacker_pos: Position, attacker_facing: Direction, target_pos: Position) -> bool {
    let dx = target_pos.x - attacker_pos.x;
    let dy = target_pos.y - attacker_pos.y;
    if dx == 0.0 && dy == 0.0 {
        return true;
    }
    match attacker_facing {
        Direction::East => dx.abs() >= dy.abs() && dx >= 0.0,
        Direction::West => dx.abs() >= dy.abs() && dx <= 0.0,
        Direction::South => dy.abs() >= dx.abs() && dy >= 0.0,
        Direction::North => dy.abs() >= dx.abs() && dy <= 0.0,
    }
}

fn in_range(a: Position, b: Position, range: f64) -> bool {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    (dx * dx + dy * dy) <= range * range
}

/// `damage = max(1, attack * modifier - defense)` (§4.4); crits multiply the
/// result. `crit_roll` is drawn by the caller from the world's seeded RNG so
/// the result is reproducible given the same RNG stream position.
pub fn compute_damage(attacker: &Stats, defender: &Stats, modifier: f64, crit_chance: f64, crit_multiplier: f64, crit_roll: f64) -> (f64, bool) {
    let base = (attacker.attack * modifier - defender.defense).max(1.0);
    if crit_roll < crit_chance {
        (base * crit_multiplier, true)
    } else {
        (base, false)
    }
}

pub struct AttackRequest {
    pub attacker: EntityId,
    pub target: EntityId,
    pub range: f64,
    pub modifier: f64,
    pub crit_chance: f64,
    pub crit_multiplier: f64,
}

/// Applies a single attack, honoring the team/range/facing-cone checks and
/// the absorbing Dead state. Returns `true` if the attack landed.
///
/// This is invoked directly (not dispatched every tick like the other
/// systems) because combat resolution is request-driven: player input or AI
/// decisions produce [`AttackRequest`]s which the caller feeds in here.
/// `rng` supplies the crit roll deterministically.
pub fn resolve_attack(world: &mut World, request: &AttackRequest, rng: &mut SeededRng) -> bool {
    if world.has_component(request.target, Dead::TAG) {
        return false;
    }

    let attacker_pos = match world.get_component::<Position>(request.attacker) {
        Some(p) => *p,
        None => return false,
    };
    let target_pos = match world.get_component::<Position>(request.target) {
        Some(p) => *p,
        None => return false,
    };

    if !in_range(attacker_pos, target_pos, request.range) {
        return false;
    }

    if let (Some(attacker_team), Some(target_team)) = (
        world.get_component::<Team>(request.attacker).copied(),
        world.get_component::<Team>(request.target).copied(),
    ) {
        if attacker_team.is_friendly(&target_team) {
            return false;
        }
    }

    if let Some(facing) = world.get_component::<Facing>(request.attacker).copied() {
        if !in_facing_cone(attacker_pos, facing.direction, target_pos) {
            return false;
        }
    }

    let attacker_stats = match world.get_component::<Stats>(request.attacker) {
        Some(s) => *s,
        None => return false,
    };
    let target_stats = match world.get_component::<Stats>(request.target) {
        Some(s) => *s,
        None => return false,
    };

    let crit_roll = rng.gen_range_f64(0.0, 1.0);
    let (damage, was_crit) = compute_damage(
        &attacker_stats,
        &target_stats,
        request.modifier,
        request.crit_chance,
        request.crit_multiplier,
        crit_roll,
    );

    let became_dead = match world.get_component_mut::<Health>(request.target) {
        Some(health) => health.apply_delta(damage),
        None => return false,
    };

    world.events_mut().emit(GameEvent::Damage {
        target: request.target,
        amount: damage,
        attacker: Some(request.attacker),
        was_crit,
    });

    if became_dead {
        let team = world
            .get_component::<Team>(request.target)
            .map(|t| t.id)
            .unwrap_or(0);
        let _ = world.add_component(request.target, Dead);
        world.events_mut().emit(GameEvent::Death {
            entity: request.target,
            team,
            killer: Some(request.attacker),
        });
    }

    true
}

/// Sweeps for any entity whose Health has silently reached zero outside of
/// `resolve_attack` (e.g. damage-over-time effects a future module might
/// add) and finalizes the Dead transition. Registered as a system so every
/// tick's deferred mutations are reconciled even if no explicit attack ran.
pub struct DeathSweepSystem;

impl System for DeathSweepSystem {
    fn name(&self) -> &'static str {
        "death_sweep"
    }

    fn update(&mut self, world: &mut World, _dt: f64) {
        let ids: Vec<EntityId> = world.get_entities().clone();
        for id in ids {
            if world.has_component(id, Dead::TAG) {
                continue;
            }
            let is_dead = match world.get_component::<Health>(id) {
                Some(h) => h.is_dead(),
                None => continue,
            };
            if is_dead {
                let team = world.get_component::<Team>(id).map(|t| t.id).unwrap_or(0);
                let _ = world.add_component(id, Dead);
                world.events_mut().emit(GameEvent::Death {
                    entity: id,
                    team,
                    killer: None,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_floor_is_one() {
        let attacker = Stats::new(1.0, 0.0, 0.0, 0.0);
        let defender = Stats::new(0.0, 100.0, 0.0, 0.0);
        let (dmg, crit) = compute_damage(&attacker, &defender, 1.0, 0.0, 2.0, 0.5);
        assert_eq!(dmg, 1.0);
        assert!(!crit);
    }

    #[test]
    fn crit_multiplies_damage() {
        let attacker = Stats::new(10.0, 0.0, 0.0, 0.0);
        let defender = Stats::new(0.0, 0.0, 0.0, 0.0);
        let (dmg, crit) = compute_damage(&attacker, &defender, 1.0, 1.0, 2.0, 0.0);
        assert_eq!(dmg, 20.0);
        assert!(crit);
    }

    #[test]
    fn facing_cone_east() {
        let pos = Position::new(0.0, 0.0);
        assert!(in_facing_cone(pos, Direction::East, Position::new(5.0, 1.0)));
        assert!(!in_facing_cone(pos, Direction::East, Position::new(-5.0, 0.0)));
    }

    /// §8 "two attackers deliver simultaneous hits reducing Health from 10 to
    /// -3; Dead flag set once, death event emitted once": the second
    /// `resolve_attack` in the same resolution pass must observe `Dead`
    /// already set by the first and bail out via the absorbing-state guard,
    /// rather than double-applying damage or emitting a second Death event.
    #[test]
    fn two_simultaneous_lethal_hits_set_dead_and_emit_death_exactly_once() {
        let mut world = World::new(1);

        let attacker_a = world.create_entity();
        world.add_component(attacker_a, Position::new(0.0, 0.0)).unwrap();
        world.add_component(attacker_a, Facing { direction: Direction::East }).unwrap();
        world.add_component(attacker_a, Stats::new(20.0, 0.0, 0.0, 0.0)).unwrap();
        world.add_component(attacker_a, Team { id: 1 }).unwrap();

        let attacker_b = world.create_entity();
        world.add_component(attacker_b, Position::new(0.0, 0.0)).unwrap();
        world.add_component(attacker_b, Facing { direction: Direction::East }).unwrap();
        world.add_component(attacker_b, Stats::new(20.0, 0.0, 0.0, 0.0)).unwrap();
        world.add_component(attacker_b, Team { id: 1 }).unwrap();

        let target = world.create_entity();
        world.add_component(target, Position::new(1.0, 0.0)).unwrap();
        world.add_component(target, Health::new(10.0)).unwrap();
        world.add_component(target, Stats::new(0.0, 0.0, 0.0, 0.0)).unwrap();
        world.add_component(target, Team { id: 2 }).unwrap();

        let mut rng = SeededRng::from_world_seed(1).split("test", &[0]);

        let request = AttackRequest {
            attacker: attacker_a,
            target,
            range: 5.0,
            modifier: 1.0,
            crit_chance: 0.0,
            crit_multiplier: 1.0,
        };
        assert!(resolve_attack(&mut world, &request, &mut rng));

        let request = AttackRequest {
            attacker: attacker_b,
            target,
            range: 5.0,
            modifier: 1.0,
            crit_chance: 0.0,
            crit_multiplier: 1.0,
        };
        assert!(!resolve_attack(&mut world, &request, &mut rng));

        assert!(world.has_component(target, Dead::TAG));

        let deaths = world
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::Death { entity, .. } if *entity == target))
            .count();
        assert_eq!(deaths, 1);
    }
}
