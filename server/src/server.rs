//! The tick loop and accept loop (§A, §5): the two long-running tasks that
//! make up the server process.

use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

use venture_shared::components::{
    Ai, Collider, Direction, Experience, Facing, Health, Inventory, Network, Position, Stats, Team, Velocity,
};
use venture_shared::events::GameEvent;
use venture_shared::procgen::{EntityGenerator, GenerationParams, Generator, Genre, OptionValue, Options};
use venture_shared::snapshot::{capture_snapshot, SnapshotRing};
use venture_shared::spatial::Bounds;
use venture_shared::systems::{award_xp, default_xp_curve, drop_item, resolve_attack, AttackRequest, LevelUpScaling};
use venture_shared::types::EntityId;

use crate::broadcast::{broadcast, BroadcastCadence};
use crate::config::ServerConfig;
use crate::connection::handle_connection;
use crate::error::ServerError;
use crate::events::{Accepted, ServerEvent};
use crate::lag_compensation::{validate_hit, HitQuery};
use crate::latency::LatencyEstimator;
use crate::state::{ClientHandle, ServerState};

const EVENTS_CHANNEL_CAPACITY: usize = 1024;
const DEFAULT_LATENCY_ESTIMATE_MS: f64 = 100.0;
const SHUTDOWN_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);
const PLAYER_COLLIDER_LAYER: u32 = 1;
const MELEE_RANGE: f64 = 1.5;
const ATTACK_ACTION_BIT: u32 = 1;
const ATTACK_MODIFIER: f64 = 1.0;
const ATTACK_CRIT_CHANCE: f64 = 0.1;
const ATTACK_CRIT_MULTIPLIER: f64 = 1.5;
const XP_PER_KILL: u64 = 25;
const PLAYER_INVENTORY_SLOTS: usize = 20;
const PLAYER_INVENTORY_MAX_WEIGHT: f64 = 100.0;
const MONSTER_TEAM_ID: u32 = 0;
const MONSTER_COLLIDER_LAYER: u32 = 2;
const MONSTER_SPAWN_DIFFICULTY: u32 = 1;
const MONSTER_SPAWN_DEPTH: u32 = 1;

pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let world_seed = config.seed.unwrap_or_else(|| {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    });
    log::info!("starting venture-server with world seed {world_seed}, genre {:?}", config.genre);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    log::info!("listening on {}", config.bind_addr);

    let (events_tx, mut events_rx) = mpsc::channel::<ServerEvent>(EVENTS_CHANNEL_CAPACITY);
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let accept_config = config.clone();
    let accept_events_tx = events_tx.clone();
    let mut accept_shutdown_rx = shutdown_rx.clone();
    let accept_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = accept_shutdown_rx.changed() => break,
                accepted = listener.accept() => {
                    let (stream, addr) = match accepted {
                        Ok(pair) => pair,
                        Err(err) => {
                            log::warn!("accept error: {err}");
                            continue;
                        }
                    };
                    log::debug!("accepted connection from {addr}");
                    let events_tx = accept_events_tx.clone();
                    let world_seed = accept_config.seed.unwrap_or(world_seed);
                    let genre = accept_config.genre;
                    let tick_rate = accept_config.tick_rate;
                    tokio::spawn(handle_connection(stream, events_tx, world_seed, genre, tick_rate));
                }
            }
        }
    });

    let mut state = ServerState::new(world_seed, config.genre, config.tick_rate);
    populate_world(&mut state);
    let world_bounds = state.world_bounds;
    let mut snapshots = SnapshotRing::new(config.snapshot_ring_size);
    let mut cadence = BroadcastCadence::new(config.snapshot_cadence);

    let tick_duration = Duration::from_secs_f64(1.0 / config.tick_rate.max(1) as f64);
    let mut ticker = tokio::time::interval(tick_duration);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut timestamp_ms: u64 = 0;
    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.changed() => {
                log::info!("shutdown signal received, draining outbound queues");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                let _ = shutdown_tx.send(true);
            }
            event = events_rx.recv() => {
                match event {
                    Some(event) => handle_event(&mut state, event, config.max_players, timestamp_ms),
                    None => break,
                }
            }
            _ = ticker.tick() => {
                timestamp_ms += tick_duration.as_millis() as u64;
                let attacks = apply_pending_inputs(&mut state);
                state.world.update(1.0 / config.tick_rate.max(1) as f64);
                resolve_pending_attacks(&mut state, &snapshots, world_bounds, config.max_rewind_ms, attacks);
                apply_death_consequences(&mut state);

                let snapshot = capture_snapshot(&state.world, timestamp_ms);
                snapshots.push(snapshot);

                let message = cadence.next_message(&state, timestamp_ms);
                broadcast(&state, message);
            }
        }
    }

    tokio::time::timeout(SHUTDOWN_DRAIN_TIMEOUT, drain(&mut state)).await.ok();
    accept_task.abort();
    Ok(())
}

async fn drain(state: &mut ServerState) {
    for client in state.clients.values() {
        let _ = client
            .outbound
            .send(venture_shared::protocol::Message::Disconnect {
                reason: "server shutting down".into(),
            })
            .await;
    }
}

fn handle_event(state: &mut ServerState, event: ServerEvent, max_players: u32, now_ms: u64) {
    match event {
        ServerEvent::Connect { player_name, outbound, snapshots, ack } => {
            if state.clients.len() as u32 >= max_players {
                let _ = ack.send(Err(venture_shared::protocol::HandshakeRejectReason::ServerFull { max_players }));
                return;
            }

            let player_id = state.allocate_player_id();
            let entity = spawn_player(state, player_id);
            state.clients.insert(
                player_id,
                ClientHandle {
                    player_id,
                    entity,
                    outbound,
                    snapshots,
                    last_acked_input_seq: 0,
                    pending_inputs: Default::default(),
                    latency: LatencyEstimator::new(DEFAULT_LATENCY_ESTIMATE_MS),
                },
            );
            log::info!("player {player_id} ('{player_name}') connected as entity {entity}");
            let _ = ack.send(Ok(Accepted { player_id, entity }));
        }
        ServerEvent::Input { player_id, seq, input } => {
            if let Some(client) = state.clients.get_mut(&player_id) {
                let sample_ms = now_ms.saturating_sub(input.client_timestamp_ms) as f64;
                client.latency.observe(sample_ms);
                client.pending_inputs.push_back(crate::state::PendingInput { seq, input });
                client.last_acked_input_seq = seq;
            }
        }
        ServerEvent::Disconnect { player_id } => {
            if let Some(client) = state.clients.remove(&player_id) {
                state.world.queue_destroy(client.entity);
                log::info!("player {player_id} disconnected");
            }
        }
    }
}

fn spawn_player(state: &mut ServerState, player_id: u64) -> venture_shared::types::EntityId {
    let entity = state.world.create_entity();
    let spawn = (state.terrain.spawn.0 as f64, state.terrain.spawn.1 as f64);
    state.world.add_component(entity, Position::new(spawn.0, spawn.1)).ok();
    state.world.add_component(entity, Velocity::new(0.0, 0.0, 0.1, 6.0)).ok();
    state
        .world
        .add_component(entity, Facing { direction: Direction::default() })
        .ok();
    state.world.add_component(entity, Health::new(100.0)).ok();
    state.world.add_component(entity, Stats::new(10.0, 10.0, 10.0, 10.0)).ok();
    state.world.add_component(entity, Team { id: player_id as u32 }).ok();
    state
        .world
        .add_component(entity, Collider::new(0.5, 0.5, PLAYER_COLLIDER_LAYER))
        .ok();
    state
        .world
        .add_component(
            entity,
            Network {
                authoritative_player_id: player_id,
                last_acked_input_seq: 0,
            },
        )
        .ok();
    state
        .world
        .add_component(entity, Experience::new(default_xp_curve))
        .ok();
    state
        .world
        .add_component(entity, Inventory::new(PLAYER_INVENTORY_SLOTS, PLAYER_INVENTORY_MAX_WEIGHT))
        .ok();
    entity
}

/// Seeds the generated dungeon with one monster per non-spawn room (§4.2),
/// drawn from the configured genre's archetype table via [`EntityGenerator`]
/// so a reconnecting client deriving content from the same world seed sees
/// the same encounter layout. The first room is reserved for player spawns.
fn populate_world(state: &mut ServerState) {
    let rooms: Vec<_> = state.terrain.rooms.iter().skip(1).copied().collect();
    if rooms.is_empty() {
        return;
    }

    let params = GenerationParams {
        difficulty: MONSTER_SPAWN_DIFFICULTY,
        depth: MONSTER_SPAWN_DEPTH,
        genre: state.genre,
        blend: None,
        options: Options::new().with("count", OptionValue::Int(rooms.len() as i64)),
    };
    let gen = EntityGenerator;
    let mut rng = state.world.rng_mut().split(gen.kind_tag(), &[0]);
    let artifacts = gen.generate(&params, &mut rng);

    for (artifact, room) in artifacts.iter().zip(rooms.iter()) {
        let (x, y) = room.center();
        let health = artifact.fields.get("health").and_then(OptionValue::as_int).unwrap_or(10) as f64;

        let entity = state.world.create_entity();
        state.world.add_component(entity, Position::new(x as f64, y as f64)).ok();
        state.world.add_component(entity, Velocity::new(0.0, 0.0, 0.1, 3.0)).ok();
        state
            .world
            .add_component(entity, Facing { direction: Direction::default() })
            .ok();
        state.world.add_component(entity, Health::new(health)).ok();
        state.world.add_component(entity, Stats::new(8.0, 4.0, 0.0, 0.0)).ok();
        state.world.add_component(entity, Team { id: MONSTER_TEAM_ID }).ok();
        state
            .world
            .add_component(entity, Collider::new(0.5, 0.5, MONSTER_COLLIDER_LAYER))
            .ok();
        state.world.add_component(entity, Ai::new(x as f64, y as f64)).ok();
    }
}

/// Reacts to this tick's gameplay events (§4.4 "observed by Progression to
/// award XP; by Inventory to drop loot"): a killer with `Experience` gains
/// XP, and the entity that just died drops everything it was carrying.
/// Every other event kind is an external-collaborator concern (§6 audio)
/// and is discarded here after having been drained.
fn apply_death_consequences(state: &mut ServerState) {
    let events = state.world.drain_events();
    for event in events {
        let GameEvent::Death { entity, killer, .. } = event else {
            continue;
        };

        if let Some(killer) = killer {
            if state.world.has_component(killer, Experience::TAG) {
                award_xp(&mut state.world, killer, XP_PER_KILL, default_xp_curve, LevelUpScaling::default());
            }
        }

        if let Some(inventory) = state.world.get_component::<Inventory>(entity) {
            let occupied_slots: Vec<usize> = inventory
                .slots
                .iter()
                .enumerate()
                .filter_map(|(slot, stack)| stack.as_ref().map(|_| slot))
                .collect();
            for slot in occupied_slots {
                let _ = drop_item(&mut state.world, entity, slot);
            }
        }
    }
}

/// One pending attack intent, carrying what lag compensation needs to
/// rewind the hit query to the attacker's perceived world state.
struct PendingAttack {
    attacker: EntityId,
    latency_ms: f64,
    client_timestamp_ms: u64,
}

/// Applies one buffered input per connected client per tick, advancing the
/// player's velocity from the movement vector (§4.6 "the server applies the
/// same input the client predicted with, at the tick it arrives"), and
/// collects attack intents for resolution after movement/collision settle.
fn apply_pending_inputs(state: &mut ServerState) -> Vec<PendingAttack> {
    let mut attacks = Vec::new();

    let entries: Vec<_> = state
        .clients
        .values_mut()
        .filter_map(|c| {
            c.pending_inputs
                .pop_front()
                .map(|pending| (c.entity, pending, c.latency.estimate_ms()))
        })
        .collect();

    for (entity, pending, latency_ms) in entries {
        if let Some(velocity) = state.world.get_component_mut::<Velocity>(entity) {
            let speed_cap = velocity.speed_cap;
            velocity.vx = pending.input.move_x as f64 * speed_cap;
            velocity.vy = pending.input.move_y as f64 * speed_cap;
        }
        // Stamped onto the world (not just `ClientHandle`) so the next
        // broadcast snapshot carries the ack the owning client needs to
        // reconcile (§4.6 step 4) -- the wire has no separate ack message.
        if let Some(network) = state.world.get_component_mut::<Network>(entity) {
            network.last_acked_input_seq = pending.seq;
        }
        if pending.input.action_bitfield & ATTACK_ACTION_BIT != 0 {
            attacks.push(PendingAttack {
                attacker: entity,
                latency_ms,
                client_timestamp_ms: pending.input.client_timestamp_ms,
            });
        }
    }

    attacks
}

/// Resolves each collected attack intent: a lag-compensated radius query
/// picks targets at the position the attacker's client perceived them at,
/// then `resolve_attack` applies the always-live team/facing/damage rules
/// (§4.7 "rewind position only, never the outcome math").
fn resolve_pending_attacks(
    state: &mut ServerState,
    snapshots: &SnapshotRing,
    world_bounds: Bounds,
    max_rewind_ms: u64,
    attacks: Vec<PendingAttack>,
) {
    for attack in attacks {
        let origin = match state.world.get_component::<Position>(attack.attacker) {
            Some(p) => *p,
            None => continue,
        };

        let query = HitQuery {
            attacker: attack.attacker,
            origin_x: origin.x,
            origin_y: origin.y,
            range: MELEE_RANGE,
            attacker_latency_ms: attack.latency_ms,
            client_timestamp_ms: attack.client_timestamp_ms,
        };
        let Some(hit) = validate_hit(snapshots, world_bounds, &state.terrain, query, max_rewind_ms) else {
            continue;
        };

        let tick = state.world.tick();
        for target in hit.targets {
            let mut rng = state
                .world
                .rng_mut()
                .split("combat-attack", &[tick as i64, attack.attacker as i64, target as i64]);
            resolve_attack(
                &mut state.world,
                &AttackRequest {
                    attacker: attack.attacker,
                    target,
                    range: MELEE_RANGE,
                    modifier: ATTACK_MODIFIER,
                    crit_chance: ATTACK_CRIT_CHANCE,
                    crit_multiplier: ATTACK_CRIT_MULTIPLIER,
                },
                &mut rng,
            );
        }
    }
}
