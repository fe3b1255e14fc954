//! Client process configuration (§6), mirroring the server's clap setup.

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "venture-client", about = "Venture game client")]
pub struct ClientConfig {
    /// Server address to connect to.
    #[arg(long, env = "VENTURE_SERVER_ADDR", default_value = "127.0.0.1:7777")]
    pub server_addr: String,

    /// Display name sent in the handshake.
    #[arg(long, env = "VENTURE_PLAYER_NAME", default_value = "player")]
    pub player_name: String,

    /// Protocol version to present in the handshake; overridable mainly for
    /// compatibility testing against an intentionally mismatched server.
    #[arg(long, env = "VENTURE_PROTOCOL_VERSION", default_value_t = venture_shared::protocol::PROTOCOL_VERSION)]
    pub protocol_version: u16,

    /// Local simulation tick rate (input sampling and prediction).
    #[arg(long, env = "VENTURE_CLIENT_TICK_RATE", default_value_t = 60)]
    pub tick_rate: u32,

    /// Unacked-input buffer capacity.
    #[arg(long, env = "VENTURE_INPUT_BUFFER_CAPACITY", default_value_t = crate::prediction::DEFAULT_INPUT_BUFFER_CAPACITY)]
    pub input_buffer_capacity: usize,

    /// Divergence threshold, in world units, above which reconciliation
    /// hard-snaps instead of blending.
    #[arg(long, env = "VENTURE_DIVERGENCE_THRESHOLD", default_value_t = crate::prediction::DEFAULT_DIVERGENCE_THRESHOLD)]
    pub divergence_threshold: f64,

    /// Interpolation delay applied to remote entities, in milliseconds.
    #[arg(long, env = "VENTURE_INTERP_DELAY_MS", default_value_t = crate::interpolation::DEFAULT_INTERP_DELAY_MS)]
    pub interp_delay_ms: u64,
}
