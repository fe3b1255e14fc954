//! The client's half of §4.5's connection handling: one handshake, then a
//! read task and a write task pair bridging the TCP stream to the tick loop
//! over channels, exactly mirroring the server's per-client task pair.

use tokio::net::TcpStream;
use tokio::sync::mpsc;

use venture_shared::protocol::{read_frame, write_frame, HandshakeAccepted, Message, PROTOCOL_VERSION};

use crate::error::ClientError;

const OUTBOUND_CHANNEL_CAPACITY: usize = 256;
const INBOUND_CHANNEL_CAPACITY: usize = 256;

/// A live connection to the server: channels to push outbound messages and
/// drain inbound ones, plus the task handles so the caller can await clean
/// shutdown.
pub struct Connection {
    pub accepted: HandshakeAccepted,
    pub outbound: mpsc::Sender<Message>,
    pub inbound: mpsc::Receiver<Message>,
    read_task: tokio::task::JoinHandle<()>,
    write_task: tokio::task::JoinHandle<()>,
}

impl Connection {
    /// Connects to `server_addr`, performs the handshake, and spawns the
    /// read/write task pair. Returns once the handshake completes (either
    /// accepted or rejected).
    pub async fn connect(server_addr: &str, player_name: String) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(server_addr).await?;
        let (mut read_half, mut write_half) = stream.into_split();

        write_frame(
            &mut write_half,
            &Message::Handshake {
                protocol_version: PROTOCOL_VERSION,
                player_name,
            },
        )
        .await?;

        let accepted = match read_frame(&mut read_half).await? {
            Message::HandshakeAck { result: Ok(accepted) } => accepted,
            Message::HandshakeAck { result: Err(reason) } => return Err(ClientError::HandshakeRejected(reason)),
            _ => return Err(ClientError::HandshakeIncomplete),
        };

        let (outbound_tx, mut outbound_rx) = mpsc::channel::<Message>(OUTBOUND_CHANNEL_CAPACITY);
        let (inbound_tx, inbound_rx) = mpsc::channel::<Message>(INBOUND_CHANNEL_CAPACITY);

        let write_task = tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                if write_frame(&mut write_half, &message).await.is_err() {
                    break;
                }
            }
        });

        let read_task = tokio::spawn(async move {
            loop {
                match read_frame(&mut read_half).await {
                    Ok(message) => {
                        if inbound_tx.send(message).await.is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            accepted,
            outbound: outbound_tx,
            inbound: inbound_rx,
            read_task,
            write_task,
        })
    }

    pub async fn shutdown(self) {
        let _ = self.outbound.send(Message::Disconnect { reason: "client exiting".into() }).await;
        self.write_task.abort();
        self.read_task.abort();
    }
}
