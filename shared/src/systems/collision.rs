//! Collision system (§4.4): broad-phase via the spatial index, narrow-phase
//! AABB overlap with a layer-mask filter, resolved by correcting position
//! along the axis of least penetration.
//!
//! Collision is the only system permitted to modify both parties' Position
//! in the same tick (§4.4).

use crate::components::{Collider, Position};
use crate::ecs::world::{log_missing_component, System};
use crate::ecs::World;
use crate::spatial::{Bounds, Quadtree, RebuildSchedule};
use crate::types::EntityId;

pub struct CollisionSystem {
    quadtree: Quadtree,
    rebuild_schedule: RebuildSchedule,
}

impl CollisionSystem {
    pub fn new(world_bounds: Bounds, rebuild_interval_ticks: u32) -> Self {
        Self {
            quadtree: Quadtree::new(world_bounds),
            rebuild_schedule: RebuildSchedule::new(rebuild_interval_ticks),
        }
    }

    /// Minimum-translation-vector resolution along the axis of least
    /// penetration. Returns the correction to apply to `a`'s position (the
    /// opposite is applied to `b`).
    pub fn resolve(a_pos: Position, a: &Collider, b_pos: Position, b: &Collider) -> Option<(f64, f64)> {
        let dx = b_pos.x - a_pos.x;
        let dy = b_pos.y - a_pos.y;
        let overlap_x = a.half_width() + b.half_width() - dx.abs();
        let overlap_y = a.half_height() + b.half_height() - dy.abs();

        if overlap_x <= 0.0 || overlap_y <= 0.0 {
            return None;
        }

        if overlap_x < overlap_y {
            let sign = if dx >= 0.0 { -1.0 } else { 1.0 };
            Some((overlap_x * sign / 2.0, 0.0))
        } else {
            let sign = if dy >= 0.0 { -1.0 } else { 1.0 };
            Some((0.0, overlap_y * sign / 2.0))
        }
    }
}

impl System for CollisionSystem {
    fn name(&self) -> &'static str {
        "collision"
    }

    fn update(&mut self, world: &mut World, _dt: f64) {
        let ids: Vec<EntityId> = world.get_entities().clone();

        if self.rebuild_schedule.tick() {
            let points = ids.iter().filter_map(|&id| {
                world.get_component::<Position>(id).map(|p| (id, p.x, p.y))
            });
            self.quadtree.rebuild(points);
        }

        let collidable: Vec<EntityId> = ids
            .into_iter()
            .filter(|&id| world.has_component(id, Collider::TAG) && world.has_component(id, Position::TAG))
            .collect();

        for &id in &collidable {
            let (pos, collider) = match (world.get_component::<Position>(id), world.get_component::<Collider>(id)) {
                (Some(p), Some(c)) => (*p, *c),
                _ => {
                    log_missing_component(id, Collider::TAG);
                    continue;
                }
            };

            // Broad-phase: query a radius covering this entity's largest
            // extent; narrow-phase re-checks exact AABBs below (§4.3).
            let broad_radius = (collider.half_width().max(collider.half_height())) * 2.0 + 1.0;
            let candidates = self.quadtree.query_radius(pos.x, pos.y, broad_radius);

            for other_id in candidates {
                if other_id == id || other_id < id {
                    // Unordered pair dedup: only the lower id resolves each
                    // pair, so a collision is not corrected twice.
                    continue;
                }
                if !collidable.contains(&other_id) {
                    continue;
                }

                let (other_pos, other_collider) = match (
                    world.get_component::<Position>(other_id),
                    world.get_component::<Collider>(other_id),
                ) {
                    (Some(p), Some(c)) => (*p, *c),
                    _ => continue,
                };

                if !collider.overlaps_on_layer(&other_collider) {
                    continue;
                }

                if let Some((dx, dy)) = Self::resolve(pos, &collider, other_pos, &other_collider) {
                    if let Some(p) = world.get_component_mut::<Position>(id) {
                        p.x += dx;
                        p.y += dy;
                    }
                    if let Some(p) = world.get_component_mut::<Position>(other_id) {
                        p.x -= dx;
                        p.y -= dy;
                    }
                }
            }
        }
    }
}
