//! Deterministic generator tree (§4.2): seeded RNG -> terrain, entities,
//! items, spells, quests, genre presets.

pub mod artifact;
pub mod genre;
pub mod terrain;

pub use artifact::{
    Artifact, EntityGenerator, GenerationParams, Generator, ItemGenerator, OptionValue, Options,
    QuestGenerator, SpellGenerator,
};
pub use genre::Genre;
pub use terrain::{generate_terrain, Rect, Terrain, TerrainParams, Tile};
