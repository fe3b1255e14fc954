//! Venture client library: prediction & reconciliation, remote-entity
//! interpolation, the connection task pair, and the input-source boundary.
//! Split into a library so `client/tests/` can exercise prediction
//! convergence directly against [`prediction::PredictedPlayer`] without a
//! real server socket; `src/main.rs` is a thin binary wrapper.

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod input;
pub mod interpolation;
pub mod prediction;
