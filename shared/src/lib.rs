//! Shared runtime for Venture: the ECS, deterministic procedural
//! generators, spatial index, gameplay systems, snapshotting and wire
//! protocol used by both the server and the client binaries.

pub mod components;
pub mod ecs;
pub mod error;
pub mod events;
pub mod procgen;
pub mod protocol;
pub mod rng;
pub mod sequence;
pub mod snapshot;
pub mod spatial;
pub mod systems;
pub mod types;

pub use ecs::{Component, ComponentTag, System, World};
pub use error::{EcsError, GenerationError};
pub use rng::SeededRng;
pub use types::{EntityId, HostRole, InputSeq, PlayerId, TeamId, Tick};
