//! Top-level client error enum: wraps the shared taxonomy plus the
//! client-specific handshake-rejected case.

use thiserror::Error;

use venture_shared::protocol::{ConnectionError, HandshakeRejectReason};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error("handshake rejected: {0:?}")]
    HandshakeRejected(HandshakeRejectReason),
    #[error("server closed the connection before completing the handshake")]
    HandshakeIncomplete,
}
