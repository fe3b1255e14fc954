//! Lag compensation correctness (§8):
//! - a hit claim within the max-rewind window is validated against state
//!   within one tick of the intended rewind target.
//! - `validate_hit` never mutates live state; it only reads the snapshot
//!   ring.
//! - concurrent hit claims arriving while snapshots are being recorded
//!   never deadlock (scenario 6) -- modeled here by interleaving pushes and
//!   queries against the same ring with no lock at all, since
//!   `validate_hit`'s contract is that it takes `&SnapshotRing` and does
//!   all its work in one call frame (see module docs on
//!   `lag_compensation`).

use venture_server::lag_compensation::{validate_hit, HitQuery};
use venture_shared::components::{Direction, Health, Position, Velocity};
use venture_shared::procgen::{Terrain, Tile};
use venture_shared::snapshot::{EntityState, SnapshotRing, WorldSnapshot};
use venture_shared::spatial::Bounds;

fn bounds() -> Bounds {
    Bounds::new(-1000.0, -1000.0, 1000.0, 1000.0)
}

fn terrain() -> Terrain {
    Terrain {
        width: 200,
        height: 200,
        tiles: vec![Tile::Floor; 200 * 200],
        rooms: vec![],
        spawn: (100, 100),
    }
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

/// Builds a 60-tick ring (one tick per 16ms, matching a ~60Hz server) where
/// the target walks steadily away from the shooter's fixed firing position.
fn ring_with_walking_target() -> SnapshotRing {
    let mut ring = SnapshotRing::new(60);
    for tick in 0..60u64 {
        let mut snap = WorldSnapshot::new(tick, tick * 16);
        snap.entities.insert(1, state_at(0.0, 0.0));
        snap.entities.insert(2, state_at(tick as f64 * 1.0, 0.0));
        ring.push(snap);
    }
    ring
}

#[test]
fn hit_claim_within_max_rewind_resolves_within_one_tick_of_target() {
    let ring = ring_with_walking_target();
    // Shooter fired at a client timestamp of 500ms with 0 estimated latency
    // applied up front (the query itself supplies the latency), so the
    // ideal rewind target is tick ~31 (500 / 16).
    let query = HitQuery {
        attacker: 1,
        origin_x: 31.0,
        origin_y: 0.0,
        range: 1.0,
        attacker_latency_ms: 0.0,
        client_timestamp_ms: 500,
    };
    let result = validate_hit(&ring, bounds(), &terrain(), query, 2000).unwrap();
    // within one tick (16ms) of the nearest recorded snapshot timestamp
    assert!((result.rewound_to_timestamp_ms as i64 - 496).abs() <= 16);
    assert_eq!(result.targets, vec![2]);
}

#[test]
fn scenario_500ms_latency_shooter_sees_stale_but_valid_target_position() {
    // §8 scenario 3: target was at x=100 500ms ago, is at x=200+ now (here
    // scaled down to the ring's tick cadence); a naive present-state check
    // would miss, but the rewound check hits.
    let mut ring = SnapshotRing::new(60);
    for tick in 0..60u64 {
        let x = if tick < 30 { 10.0 } else { 50.0 };
        let mut snap = WorldSnapshot::new(tick, tick * 16);
        snap.entities.insert(1, state_at(0.0, 0.0));
        snap.entities.insert(2, state_at(x, 0.0));
        ring.push(snap);
    }

    // Present-state (tick 59, x=50) is out of range for a shot aimed at
    // x=10; the rewound historical state (early ticks, x=10) is in range.
    let query = HitQuery {
        attacker: 1,
        origin_x: 10.0,
        origin_y: 0.0,
        range: 2.0,
        attacker_latency_ms: 250.0,
        client_timestamp_ms: 200,
    };
    let result = validate_hit(&ring, bounds(), &terrain(), query, 2000).unwrap();
    assert_eq!(result.targets, vec![2]);
}

#[test]
fn rewind_beyond_max_rewind_ms_clamps_to_the_window_floor() {
    let ring = ring_with_walking_target();
    let newest = ring.newest_timestamp().unwrap();
    let query = HitQuery {
        attacker: 1,
        origin_x: 0.0,
        origin_y: 0.0,
        range: 1.0,
        attacker_latency_ms: 10_000.0,
        client_timestamp_ms: newest,
    };
    let result = validate_hit(&ring, bounds(), &terrain(), query, 100).unwrap();
    assert!(result.rewound_to_timestamp_ms >= newest.saturating_sub(100));
}

#[test]
fn validate_hit_never_mutates_the_ring() {
    let ring = ring_with_walking_target();
    let before_len = ring.len();
    let before_newest = ring.newest_timestamp();

    let query = HitQuery {
        attacker: 1,
        origin_x: 5.0,
        origin_y: 0.0,
        range: 2.0,
        attacker_latency_ms: 100.0,
        client_timestamp_ms: 300,
    };
    let _ = validate_hit(&ring, bounds(), &terrain(), query, 2000);

    assert_eq!(ring.len(), before_len);
    assert_eq!(ring.newest_timestamp(), before_newest);
}

#[test]
fn four_concurrent_hit_claims_all_resolve_against_a_being_recorded_ring() {
    // Regression for the recursive-lock hazard (§4.7, scenario 6): simulate
    // snapshots still arriving (more pushes) interleaved with multiple hit
    // validations against the same ring reference. Since `validate_hit`
    // takes a shared reference and never locks anything internally, this is
    // just ordinary interleaved reads/writes under Rust's borrow rules, with
    // no risk of the deadlock the spec calls out.
    let mut ring = ring_with_walking_target();

    let queries = [
        HitQuery { attacker: 1, origin_x: 10.0, origin_y: 0.0, range: 2.0, attacker_latency_ms: 0.0, client_timestamp_ms: 160 },
        HitQuery { attacker: 1, origin_x: 20.0, origin_y: 0.0, range: 2.0, attacker_latency_ms: 0.0, client_timestamp_ms: 320 },
        HitQuery { attacker: 1, origin_x: 30.0, origin_y: 0.0, range: 2.0, attacker_latency_ms: 0.0, client_timestamp_ms: 480 },
        HitQuery { attacker: 1, origin_x: 40.0, origin_y: 0.0, range: 2.0, attacker_latency_ms: 0.0, client_timestamp_ms: 640 },
    ];

    for (i, query) in queries.into_iter().enumerate() {
        // A new snapshot "arrives" between each validated claim.
        let mut snap = WorldSnapshot::new(60 + i as u64, (60 + i as u64) * 16);
        snap.entities.insert(1, state_at(0.0, 0.0));
        snap.entities.insert(2, state_at((60 + i) as f64, 0.0));
        ring.push(snap);

        let result = validate_hit(&ring, bounds(), &terrain(), query, 2000);
        assert!(result.is_some(), "claim {i} failed to resolve");
        assert_eq!(result.unwrap().targets, vec![2]);
    }
}
