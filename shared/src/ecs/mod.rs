//! Entity-Component-System runtime (§4.1).

pub mod component;
pub mod world;

pub use component::Component;
pub use world::{ComponentTag, System, World};
