//! The client tick loop (§A, §5 "Client owns: one tick loop task, one
//! network read task, one network write task"): samples local input,
//! predicts movement, reconciles against authoritative snapshots, and keeps
//! the interpolation buffer fed for every other visible entity.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use venture_shared::components::{Position, Velocity};
use venture_shared::protocol::Message;
use venture_shared::snapshot::{apply_delta, WorldSnapshot};
use venture_shared::types::{EntityId, InputSeq};

use crate::config::ClientConfig;
use crate::connection::Connection;
use crate::error::ClientError;
use crate::input::InputSource;
use crate::interpolation::InterpolationBuffer;
use crate::prediction::PredictedPlayer;

/// Runs the client to completion: connects, then drives the tick loop until
/// a shutdown signal fires or the connection is lost.
pub async fn run(config: ClientConfig, mut input_source: Box<dyn InputSource>) -> Result<(), ClientError> {
    let mut connection = Connection::connect(&config.server_addr, config.player_name.clone()).await?;
    let local_entity = connection.accepted.entity;
    log::info!(
        "connected as player {} (entity {local_entity}), world seed {}, genre {:?}",
        connection.accepted.player_id,
        connection.accepted.world_seed,
        connection.accepted.genre
    );

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let mut player = PredictedPlayer::new(Position::new(0.0, 0.0), Velocity::new(0.0, 0.0, 0.1, 6.0))
        .with_tuning(config.input_buffer_capacity, config.divergence_threshold);
    let mut remote = InterpolationBuffer::new();
    let mut last_full: Option<WorldSnapshot> = None;
    let interp_delay_ms = config.interp_delay_ms;

    let tick_rate = connection.accepted.tick_rate.max(1);
    let tick_duration = Duration::from_secs_f64(1.0 / tick_rate as f64);
    let dt = tick_duration.as_secs_f64();
    let mut ticker = tokio::time::interval(tick_duration);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut seq: InputSeq = 0;
    let mut timestamp_ms: u64 = 0;

    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.changed() => {
                log::info!("client shutting down");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                let _ = shutdown_tx.send(true);
            }
            inbound = connection.inbound.recv() => {
                match inbound {
                    Some(message) => handle_inbound(message, local_entity, &mut player, &mut remote, &mut last_full, dt, seq),
                    None => {
                        log::warn!("server connection closed");
                        break;
                    }
                }
            }
            _ = ticker.tick() => {
                timestamp_ms += tick_duration.as_millis() as u64;
                seq += 1;
                let input = input_source.sample(timestamp_ms);
                player.predict(seq, input, dt);
                if connection.outbound.send(Message::PlayerInput { seq, input }).await.is_err() {
                    break;
                }
            }
        }
    }

    connection.shutdown().await;
    Ok(())
}

fn handle_inbound(
    message: Message,
    local_entity: EntityId,
    player: &mut PredictedPlayer,
    remote: &mut InterpolationBuffer,
    last_full: &mut Option<WorldSnapshot>,
    dt: f64,
    fallback_seq: InputSeq,
) {
    let snapshot = match message {
        Message::WorldSnapshotFull(snapshot) => {
            *last_full = Some(snapshot.clone());
            snapshot
        }
        Message::WorldSnapshotDelta(delta) => {
            let Some(base) = last_full.as_ref() else {
                log::warn!("received a delta before any full snapshot, dropping");
                return;
            };
            let snapshot = apply_delta(base, &delta);
            *last_full = Some(snapshot.clone());
            snapshot
        }
        Message::Error { code, message } => {
            log::warn!("server error {code:?}: {message}");
            return;
        }
        Message::Disconnect { reason } => {
            log::info!("server requested disconnect: {reason}");
            return;
        }
        _ => return,
    };

    if let Some(state) = snapshot.entities.get(&local_entity) {
        // `acked_seq` comes from the server's `Network` component (§4.6 step
        // 4's actual ack); falling back to the locally-sent sequence only
        // covers the brief window before the first snapshot reflects this
        // client's own entity (freshly spawned, component not yet visible).
        let acked_seq = state.acked_seq.unwrap_or(fallback_seq);
        player.reconcile(state.position, state.velocity, acked_seq, dt);
    }
    remote.push(snapshot);
}
