//! Progression system (§4.4): XP awards, level-ups, stat scaling, skill
//! points. The XP curve is pluggable; the default is exponential.

use crate::components::{Experience, Stats};
use crate::events::GameEvent;
use crate::ecs::World;
use crate::types::EntityId;

/// Default exponential XP curve: `required_xp(level) = base * growth^(level-1)`.
pub fn default_xp_curve(level: u32) -> u64 {
    const BASE: f64 = 100.0;
    const GROWTH: f64 = 1.35;
    (BASE * GROWTH.powi(level as i32 - 1)).round() as u64
}

/// Per-level stat scaling applied on level-up. A flat additive bump per
/// stat keeps the math simple and fully deterministic; genres/archetypes
/// that want different curves can substitute a different
/// [`LevelUpScaling`].
#[derive(Debug, Clone, Copy)]
pub struct LevelUpScaling {
    pub attack_per_level: f64,
    pub defense_per_level: f64,
    pub magic_power_per_level: f64,
    pub magic_defense_per_level: f64,
    pub skill_points_per_level: u32,
}

impl Default for LevelUpScaling {
    fn default() -> Self {
        Self {
            attack_per_level: 1.5,
            defense_per_level: 1.0,
            magic_power_per_level: 1.2,
            magic_defense_per_level: 1.0,
            skill_points_per_level: 1,
        }
    }
}

/// Awards `amount` XP to `entity`, applying as many level-ups as the amount
/// covers (handles large XP grants that cross multiple levels in one call),
/// using `curve` to recompute `required_xp` at each new level.
pub fn award_xp(
    world: &mut World,
    entity: EntityId,
    amount: u64,
    curve: impl Fn(u32) -> u64,
    scaling: LevelUpScaling,
) {
    let mut levels_gained = 0u32;
    let mut leveled_to = None;
    if let Some(exp) = world.get_component_mut::<Experience>(entity) {
        exp.current_xp += amount;
        while exp.current_xp >= exp.required_xp {
            exp.current_xp -= exp.required_xp;
            exp.level += 1;
            exp.required_xp = curve(exp.level);
            exp.skill_points += scaling.skill_points_per_level;
            levels_gained += 1;
            leveled_to = Some(exp.level);
        }
    }

    if let Some(new_level) = leveled_to {
        if let Some(stats) = world.get_component_mut::<Stats>(entity) {
            let levels = levels_gained as f64;
            stats.attack += scaling.attack_per_level * levels;
            stats.defense += scaling.defense_per_level * levels;
            stats.magic_power += scaling.magic_power_per_level * levels;
            stats.magic_defense += scaling.magic_defense_per_level * levels;
        }
        world.events_mut().emit(GameEvent::LevelUp {
            entity,
            new_level,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Team;

    fn setup(world: &mut World) -> EntityId {
        let id = world.create_entity();
        world.add_component(id, Experience::new(default_xp_curve)).unwrap();
        world.add_component(id, Stats::new(5.0, 5.0, 5.0, 5.0)).unwrap();
        world.add_component(id, Team { id: 0 }).unwrap();
        id
    }

    #[test]
    fn awards_xp_without_leveling() {
        let mut world = World::new(1);
        let id = setup(&mut world);
        award_xp(&mut world, id, 10, default_xp_curve, LevelUpScaling::default());
        let exp = world.get_component::<Experience>(id).unwrap();
        assert_eq!(exp.level, 1);
        assert_eq!(exp.current_xp, 10);
    }

    #[test]
    fn levels_up_and_scales_stats() {
        let mut world = World::new(1);
        let id = setup(&mut world);
        award_xp(&mut world, id, 500, default_xp_curve, LevelUpScaling::default());
        let exp = world.get_component::<Experience>(id).unwrap();
        assert!(exp.level > 1);
        let stats = world.get_component::<Stats>(id).unwrap();
        assert!(stats.attack > 5.0);
    }
}
