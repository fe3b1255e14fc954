//! Authoritative Venture server library: the tick loop, per-client
//! connection handling, lag compensation, snapshot broadcast, and
//! persistence. Split into a library so `server/tests/` can exercise the
//! lag-compensation and snapshot-cadence logic directly without going
//! through a real TCP socket; `src/main.rs` is a thin binary wrapper that
//! parses configuration and calls [`server::run`].

pub mod broadcast;
pub mod config;
pub mod connection;
pub mod error;
pub mod events;
pub mod lag_compensation;
pub mod latency;
pub mod persistence;
pub mod server;
pub mod state;
