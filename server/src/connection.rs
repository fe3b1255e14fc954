//! Per-client connection handling: one handshake, then a read task and a
//! write task pair communicating with the tick loop over channels
//! (§A "the server owns the per-client read/write task pairs").

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch};

use venture_shared::procgen::Genre;
use venture_shared::protocol::{
    read_frame, write_frame, ErrorCode, HandshakeAccepted, HandshakeRejectReason, Message,
    PROTOCOL_VERSION,
};
use venture_shared::types::PlayerId;

use crate::events::{Accepted, ServerEvent};

const OUTBOUND_CHANNEL_CAPACITY: usize = 256;

/// Drives one accepted TCP connection end to end: performs the handshake,
/// then runs the read loop and a write task concurrently until either side
/// closes or an I/O error occurs.
pub async fn handle_connection(
    stream: TcpStream,
    events_tx: mpsc::Sender<ServerEvent>,
    world_seed: u64,
    genre: Genre,
    tick_rate: u32,
) {
    let (mut read_half, mut write_half) = stream.into_split();
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<Message>(OUTBOUND_CHANNEL_CAPACITY);
    let (snapshot_tx, mut snapshot_rx) = watch::channel::<Option<Message>>(None);

    let player_id = match do_handshake(
        &mut read_half,
        &mut write_half,
        &events_tx,
        outbound_tx,
        snapshot_tx,
        world_seed,
        genre,
        tick_rate,
    )
    .await
    {
        Some(id) => id,
        None => return,
    };

    // Snapshots (latest-wins, §4.8) and control messages (reliable, ordered)
    // race on the same write half; a client with nothing new to say never
    // blocks the other stream.
    let write_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                changed = snapshot_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let message = snapshot_rx.borrow_and_update().clone();
                    if let Some(message) = message {
                        if write_frame(&mut write_half, &message).await.is_err() {
                            break;
                        }
                    }
                }
                received = outbound_rx.recv() => {
                    match received {
                        Some(message) => {
                            if write_frame(&mut write_half, &message).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
            }
        }
    });

    loop {
        match read_frame(&mut read_half).await {
            Ok(Message::PlayerInput { seq, input }) => {
                if events_tx
                    .send(ServerEvent::Input { player_id, seq, input })
                    .await
                    .is_err()
                {
                    break;
                }
            }
            Ok(Message::Disconnect { .. }) | Err(_) => break,
            Ok(_other) => {
                log::warn!("player {player_id} sent an unexpected message kind after handshake");
            }
        }
    }

    let _ = events_tx.send(ServerEvent::Disconnect { player_id }).await;
    write_task.abort();
    log::debug!("connection for player {player_id} closed");
}

/// Reads the first frame (must be a `Handshake`), registers the client with
/// the tick loop, and replies with the `HandshakeAck`. Returns the assigned
/// `PlayerId` on success.
async fn do_handshake<R, W>(
    reader: &mut R,
    writer: &mut W,
    events_tx: &mpsc::Sender<ServerEvent>,
    outbound_tx: mpsc::Sender<Message>,
    snapshot_tx: watch::Sender<Option<Message>>,
    world_seed: u64,
    genre: Genre,
    tick_rate: u32,
) -> Option<PlayerId>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let message = read_frame(reader).await.ok()?;
    let (protocol_version, player_name) = match message {
        Message::Handshake {
            protocol_version,
            player_name,
        } => (protocol_version, player_name),
        _ => {
            let _ = write_frame(
                writer,
                &Message::Error {
                    code: ErrorCode::MalformedMessage,
                    message: "expected Handshake as the first message".into(),
                },
            )
            .await;
            return None;
        }
    };

    if protocol_version != PROTOCOL_VERSION {
        let _ = write_frame(
            writer,
            &Message::HandshakeAck {
                result: Err(HandshakeRejectReason::ProtocolVersionMismatch {
                    expected: PROTOCOL_VERSION,
                    got: protocol_version,
                }),
            },
        )
        .await;
        return None;
    }

    let (ack_tx, ack_rx) = oneshot::channel();
    if events_tx
        .send(ServerEvent::Connect {
            player_name,
            outbound: outbound_tx,
            snapshots: snapshot_tx,
            ack: ack_tx,
        })
        .await
        .is_err()
    {
        return None;
    }

    match ack_rx.await {
        Ok(Ok(Accepted { player_id, entity })) => {
            let accepted = HandshakeAccepted {
                player_id,
                entity,
                world_seed,
                genre,
                tick_rate,
            };
            let _ = write_frame(writer, &Message::HandshakeAck { result: Ok(accepted) }).await;
            Some(player_id)
        }
        Ok(Err(reason)) => {
            let _ = write_frame(writer, &Message::HandshakeAck { result: Err(reason) }).await;
            None
        }
        Err(_) => None,
    }
}
