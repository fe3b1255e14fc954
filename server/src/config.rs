//! Process configuration (§6), overridable by flag or environment variable
//! via `clap`'s `derive` + `env` features, matching the pack's CLI
//! convention.

use clap::Parser;
use venture_shared::procgen::Genre;

fn parse_genre(s: &str) -> Result<Genre, String> {
    Genre::ALL
        .iter()
        .find(|g| g.tag().eq_ignore_ascii_case(s))
        .copied()
        .ok_or_else(|| format!("unknown genre '{s}', expected one of fantasy/sci-fi/horror/cyberpunk/post-apocalyptic"))
}

#[derive(Debug, Clone, Parser)]
#[command(name = "venture-server", about = "Authoritative Venture game server")]
pub struct ServerConfig {
    /// Address to bind the TCP listener on.
    #[arg(long, env = "VENTURE_BIND_ADDR", default_value = "0.0.0.0:7777")]
    pub bind_addr: String,

    /// Maximum simultaneous connected players.
    #[arg(long, env = "VENTURE_MAX_PLAYERS", default_value_t = 32)]
    pub max_players: u32,

    /// Simulation ticks per second.
    #[arg(long, env = "VENTURE_TICK_RATE", default_value_t = 30)]
    pub tick_rate: u32,

    /// World seed. A random seed is drawn from OS entropy at startup if
    /// unset, then logged so the run can be reproduced.
    #[arg(long, env = "VENTURE_SEED")]
    pub seed: Option<u64>,

    /// Content genre for procedural generation.
    #[arg(long, env = "VENTURE_GENRE", default_value = "fantasy", value_parser = parse_genre)]
    pub genre: Genre,

    /// How many tick-snapshots the lag-compensation/broadcast ring retains.
    #[arg(long, env = "VENTURE_SNAPSHOT_RING_SIZE", default_value_t = 180)]
    pub snapshot_ring_size: usize,

    /// Send a full snapshot every N ticks; deltas in between.
    #[arg(long, env = "VENTURE_SNAPSHOT_CADENCE", default_value_t = 30)]
    pub snapshot_cadence: u32,

    /// Hard ceiling on how far back in time lag compensation may rewind.
    #[arg(long, env = "VENTURE_MAX_REWIND_MS", default_value_t = 1000)]
    pub max_rewind_ms: u64,

    /// Directory save/load operate against.
    #[arg(long, env = "VENTURE_SAVE_DIR", default_value = "./saves")]
    pub save_dir: String,
}
