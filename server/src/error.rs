//! Top-level server error enum: wraps the shared taxonomy plus transient
//! I/O and resource-exhaustion kinds encountered at task boundaries (§7).

use thiserror::Error;
use venture_shared::protocol::ConnectionError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error("server is full ({max_players} players already connected)")]
    ServerFull { max_players: u32 },
    #[error("save/load failed: {0}")]
    Persistence(String),
}
