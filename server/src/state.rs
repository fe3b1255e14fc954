//! Shared mutable server state: the ECS world, per-client bookkeeping, and
//! the snapshot ring lag compensation and broadcast both read from.

use std::collections::{HashMap, VecDeque};

use tokio::sync::{mpsc, watch};

use venture_shared::procgen::{generate_terrain, Genre, Terrain, TerrainParams};
use venture_shared::protocol::{InputFrame, Message};
use venture_shared::spatial::{Bounds, Quadtree};
use venture_shared::systems::{AiSystem, CollisionSystem, DeathSweepSystem, MovementSystem};
use venture_shared::types::{EntityId, InputSeq, PlayerId, Tick};
use venture_shared::snapshot::WorldSnapshot;
use venture_shared::{SeededRng, World};

use crate::latency::LatencyEstimator;

/// One buffered input frame awaiting application on the next tick it's due,
/// carrying the sequence number so the client can be told what was last
/// acked.
pub struct PendingInput {
    pub seq: InputSeq,
    pub input: InputFrame,
}

pub struct ClientHandle {
    pub player_id: PlayerId,
    pub entity: EntityId,
    pub outbound: mpsc::Sender<Message>,
    pub snapshots: watch::Sender<Option<Message>>,
    pub last_acked_input_seq: InputSeq,
    pub pending_inputs: VecDeque<PendingInput>,
    pub latency: LatencyEstimator,
}

/// All server-owned state for one running match. Single-owner: only the
/// tick loop task mutates this directly; connection tasks communicate
/// through channels rather than locking it, which is what keeps lag
/// compensation's rewind free of recursive locking (§4.7) -- there is only
/// ever one lock-free mutable borrow in flight.
pub struct ServerState {
    pub world: World,
    pub clients: HashMap<PlayerId, ClientHandle>,
    pub next_player_id: PlayerId,
    pub world_seed: u64,
    pub tick_rate: u32,
    pub world_bounds: Bounds,
    /// The dungeon generated once at match start from `world_seed` under the
    /// `"terrain"` kind tag (§4.2); player spawns and lag-compensated hit
    /// validation both read this rather than treating the world as an open
    /// rectangle.
    pub terrain: Terrain,
    pub genre: Genre,
}

impl ServerState {
    /// Generates the match's terrain from `world_seed` before anything else
    /// touches the world RNG, so every later split (entities, items, combat)
    /// observes the same child-RNG tree a reconnecting client would derive
    /// independently from the same seed (§4.2, §8).
    pub fn new(world_seed: u64, genre: Genre, tick_rate: u32) -> Self {
        let mut world = World::new(world_seed);
        let mut terrain_rng = world.rng_mut().split("terrain", &[0]);
        let terrain = generate_terrain(&TerrainParams::default(), &mut terrain_rng)
            .expect("default terrain params always produce a valid dungeon");
        let world_bounds = Bounds::new(0.0, 0.0, terrain.width as f64, terrain.height as f64);

        world.register_system(Box::new(MovementSystem));
        world.register_system(Box::new(AiSystem));
        world.register_system(Box::new(CollisionSystem::new(world_bounds, 60)));
        world.register_system(Box::new(DeathSweepSystem));

        Self {
            world,
            clients: HashMap::new(),
            next_player_id: 1,
            world_seed,
            tick_rate,
            world_bounds,
            terrain,
            genre,
        }
    }

    pub fn allocate_player_id(&mut self) -> PlayerId {
        let id = self.next_player_id;
        self.next_player_id += 1;
        id
    }

    pub fn rng_mut(&mut self) -> &mut SeededRng {
        self.world.rng_mut()
    }

    pub fn current_tick(&self) -> Tick {
        self.world.tick()
    }
}

/// Builds a quadtree over a historical snapshot's entity positions, used by
/// lag compensation to run a hit-scan query against where the world *was*
/// rather than where it is now (§4.7).
pub fn quadtree_from_snapshot(snapshot: &WorldSnapshot, bounds: Bounds) -> Quadtree {
    let mut quadtree = Quadtree::new(bounds);
    quadtree.rebuild(
        snapshot
            .entities
            .iter()
            .map(|(&id, state)| (id, state.position.x, state.position.y)),
    );
    quadtree
}
