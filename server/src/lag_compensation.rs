//! Server-side lag compensation (§4.7): rewinds hit-scan/melee validation
//! to the attacker's perceived world state rather than the server's
//! current tick.
//!
//! The public entry point ([`validate_hit`]) takes the [`SnapshotRing`] by
//! shared reference and does all its work in one call frame -- there is no
//! internal locking to re-enter, so the "no recursive locking" contract
//! this module is grounded on is satisfied by construction rather than by
//! discipline.

use venture_shared::procgen::Terrain;
use venture_shared::snapshot::SnapshotRing;
use venture_shared::spatial::Bounds;
use venture_shared::types::EntityId;

use crate::state::quadtree_from_snapshot;

#[derive(Debug, Clone, Copy)]
pub struct HitQuery {
    pub attacker: EntityId,
    pub origin_x: f64,
    pub origin_y: f64,
    pub range: f64,
    /// The attacker's estimated one-way latency at the moment the input
    /// that produced this attack was sent, used to compute the rewind
    /// target timestamp.
    pub attacker_latency_ms: f64,
    /// Client timestamp the input frame carried.
    pub client_timestamp_ms: u64,
}

#[derive(Debug, Clone)]
pub struct HitResult {
    pub targets: Vec<EntityId>,
    pub rewound_to_timestamp_ms: u64,
}

/// Rewinds to the snapshot closest to `client_timestamp_ms - attacker_latency_ms`
/// (clamped into the ring's retained window, §4.7 step 2), then runs a
/// radius query against that historical position data, filtered by line of
/// sight against the generated terrain (§4.7 step 4 "geometry, LOS, team" --
/// team filtering happens afterward in `resolve_attack` against live state).
pub fn validate_hit(
    ring: &SnapshotRing,
    bounds: Bounds,
    terrain: &Terrain,
    query: HitQuery,
    max_rewind_ms: u64,
) -> Option<HitResult> {
    let ideal_target_ms = query.client_timestamp_ms.saturating_sub(query.attacker_latency_ms.round() as u64);

    let oldest = ring.oldest_timestamp()?;
    let newest = ring.newest_timestamp()?;
    let floor_ms = newest.saturating_sub(max_rewind_ms).max(oldest);
    let clamped_target_ms = ideal_target_ms.clamp(floor_ms, newest);

    let snapshot = ring.closest_to_timestamp(clamped_target_ms)?;
    let quadtree = quadtree_from_snapshot(snapshot, bounds);

    let targets: Vec<EntityId> = quadtree
        .query_radius(query.origin_x, query.origin_y, query.range)
        .into_iter()
        .filter(|&id| id != query.attacker)
        .filter(|&id| {
            snapshot.entities.get(&id).is_some_and(|state| {
                has_line_of_sight(terrain, (query.origin_x, query.origin_y), (state.position.x, state.position.y))
            })
        })
        .collect();

    Some(HitResult {
        targets,
        rewound_to_timestamp_ms: snapshot.timestamp_ms,
    })
}

/// Tile-grid raycast between two world points: samples the straight line at
/// one point per tile of travel and requires every sampled tile be floor.
/// World coordinates map 1:1 onto terrain tile indices (§4.2), so rounding
/// each sample to the nearest tile is exact enough for a melee-range check.
fn has_line_of_sight(terrain: &Terrain, from: (f64, f64), to: (f64, f64)) -> bool {
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;
    let steps = dx.hypot(dy).ceil().max(1.0) as u32;
    for step in 0..=steps {
        let t = step as f64 / steps as f64;
        let x = (from.0 + dx * t).round() as i32;
        let y = (from.1 + dy * t).round() as i32;
        if !terrain.is_walkable(x, y) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use venture_shared::components::{Direction, Health, Position, Velocity};
    use venture_shared::procgen::Tile;
    use venture_shared::snapshot::{EntityState, WorldSnapshot};

    fn bounds() -> Bounds {
        Bounds::new(-1000.0, -1000.0, 1000.0, 1000.0)
    }

    /// A large open floor, clear line of sight everywhere.
    fn open_terrain() -> Terrain {
        Terrain {
            width: 200,
            height: 200,
            tiles: vec![Tile::Floor; 200 * 200],
            rooms: vec![],
            spawn: (100, 100),
        }
    }

    /// Same open floor, but with a single solid wall column at `wall_x`
    /// spanning every row, usable to put an obstruction between two points.
    fn terrain_with_wall_at(wall_x: i32) -> Terrain {
        let mut terrain = open_terrain();
        for y in 0..terrain.height {
            terrain.tiles[(y * terrain.width + wall_x) as usize] = Tile::Wall;
        }
        terrain
    }

    fn state_at(x: f64, y: f64) -> EntityState {
        EntityState {
            position: Position::new(x, y),
            velocity: Velocity::new(0.0, 0.0, 0.0, 5.0),
            health: Some(Health::new(100.0)),
            facing: Some(Direction::South),
            acked_seq: None,
        }
    }

    fn ring_with_moving_target() -> SnapshotRing {
        let mut ring = SnapshotRing::new(10);
        for tick in 0..10u64 {
            let mut snap = WorldSnapshot::new(tick, tick * 100);
            snap.entities.insert(1, state_at(0.0, 0.0));
            // Target walks away from origin over time.
            snap.entities.insert(2, state_at(tick as f64 * 2.0, 0.0));
            ring.push(snap);
        }
        ring
    }

    #[test]
    fn rewinds_to_where_target_was_when_client_fired() {
        let ring = ring_with_moving_target();
        // At real (newest) time the target is at x=18, out of a 3-unit
        // range; rewinding ~600ms (6 ticks) back puts it at x=6.
        let query = HitQuery {
            attacker: 1,
            origin_x: 6.0,
            origin_y: 0.0,
            range: 3.0,
            attacker_latency_ms: 0.0,
            client_timestamp_ms: 600,
        };
        let result = validate_hit(&ring, bounds(), &open_terrain(), query, 2000).unwrap();
        assert_eq!(result.targets, vec![2]);
    }

    #[test]
    fn rewind_is_clamped_to_max_rewind_ms() {
        let ring = ring_with_moving_target();
        let query = HitQuery {
            attacker: 1,
            origin_x: 0.0,
            origin_y: 0.0,
            range: 1.0,
            attacker_latency_ms: 5000.0,
            client_timestamp_ms: 900,
        };
        let result = validate_hit(&ring, bounds(), &open_terrain(), query, 100).unwrap();
        assert!(result.rewound_to_timestamp_ms >= 800);
    }

    #[test]
    fn target_behind_a_wall_is_excluded_by_line_of_sight() {
        let ring = ring_with_moving_target();
        // At tick 3 (client_timestamp_ms 300) the target sits at x=6, well
        // within geometric range of an attacker at x=0, but a wall at x=3
        // sits directly between them.
        let terrain = terrain_with_wall_at(3);
        let query = HitQuery {
            attacker: 1,
            origin_x: 0.0,
            origin_y: 0.0,
            range: 10.0,
            attacker_latency_ms: 0.0,
            client_timestamp_ms: 300,
        };
        let result = validate_hit(&ring, bounds(), &terrain, query, 2000).unwrap();
        assert!(result.targets.is_empty());
    }

    #[test]
    fn target_with_clear_line_of_sight_is_still_included() {
        let ring = ring_with_moving_target();
        let terrain = open_terrain();
        let query = HitQuery {
            attacker: 1,
            origin_x: 0.0,
            origin_y: 0.0,
            range: 10.0,
            attacker_latency_ms: 0.0,
            client_timestamp_ms: 300,
        };
        let result = validate_hit(&ring, bounds(), &terrain, query, 2000).unwrap();
        assert_eq!(result.targets, vec![2]);
    }
}
