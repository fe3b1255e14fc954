//! Save/load (§6). Saves are [RON](https://github.com/ron-rs/ron)-encoded
//! [`SaveRecord`]s on disk, addressed by a player-chosen slot name that is
//! validated against path traversal before touching the filesystem. RON
//! (rather than `bincode`, which the wire protocol uses) is chosen
//! specifically because §6 requires save files be "a self-describing
//! structured record (key-value, not positional)" -- `bincode`'s encoding is
//! positional and would silently corrupt an older save the moment a struct
//! field were reordered, which is exactly the failure mode a self-describing
//! format avoids.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use venture_shared::components::{Equipment, Experience, Health, Inventory, Position, Stats};
use venture_shared::procgen::Genre;
use venture_shared::types::{EntityId, Tick};

/// Bumped whenever [`SaveRecord`]'s shape changes incompatibly.
pub const SAVE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("save slot name '{0}' is invalid (must be a single path component with no '..')")]
    InvalidSlotName(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode save record: {0}")]
    Encode(#[from] ron::Error),
    #[error("failed to decode save record: {0}")]
    Decode(#[from] ron::de::SpannedError),
    #[error("save record format version {found} is newer than this binary supports ({supported})")]
    UnsupportedFormatVersion { found: u32, supported: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub position: Position,
    pub health: Health,
    pub stats: Stats,
    pub experience: Experience,
    pub inventory: Inventory,
    pub equipment: Equipment,
}

/// One discovered (fog-of-war-revealed) terrain tile. The terrain itself is
/// never saved -- it's fully reproducible from `world_seed` (§4.2) -- only
/// which tiles this save's player has actually seen.
pub type DiscoveredTile = (i32, i32);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveRecord {
    pub format_version: u32,
    pub world_seed: u64,
    pub genre: Genre,
    pub tick: Tick,
    pub players: Vec<(EntityId, PlayerRecord)>,
    pub discovered_tiles: Vec<DiscoveredTile>,
    pub settings: BTreeMap<String, String>,
}

impl SaveRecord {
    pub fn new(
        world_seed: u64,
        genre: Genre,
        tick: Tick,
        players: Vec<(EntityId, PlayerRecord)>,
        discovered_tiles: Vec<DiscoveredTile>,
        settings: BTreeMap<String, String>,
    ) -> Self {
        Self {
            format_version: SAVE_FORMAT_VERSION,
            world_seed,
            genre,
            tick,
            players,
            discovered_tiles,
            settings,
        }
    }

    /// Applies forward migrations in place. A no-op today since only one
    /// format version has ever existed, but kept so the migration seam is
    /// exercised rather than invented the day it's first needed.
    fn migrate(self) -> Result<Self, PersistenceError> {
        if self.format_version > SAVE_FORMAT_VERSION {
            return Err(PersistenceError::UnsupportedFormatVersion {
                found: self.format_version,
                supported: SAVE_FORMAT_VERSION,
            });
        }
        Ok(self)
    }
}

/// Rejects slot names that are empty, absolute, or contain any `..`
/// component -- the save directory must never be escaped (§6).
fn validate_slot_name(slot: &str) -> Result<(), PersistenceError> {
    let path = Path::new(slot);
    let is_single_normal_component = path.components().count() == 1
        && matches!(path.components().next(), Some(std::path::Component::Normal(_)));
    if slot.is_empty() || !is_single_normal_component {
        return Err(PersistenceError::InvalidSlotName(slot.to_string()));
    }
    Ok(())
}

fn slot_path(save_dir: &Path, slot: &str) -> Result<PathBuf, PersistenceError> {
    validate_slot_name(slot)?;
    Ok(save_dir.join(format!("{slot}.ron")))
}

pub fn save_game(save_dir: &Path, slot: &str, record: &SaveRecord) -> Result<(), PersistenceError> {
    let path = slot_path(save_dir, slot)?;
    std::fs::create_dir_all(save_dir)?;
    let text = ron::ser::to_string_pretty(record, ron::ser::PrettyConfig::default())?;
    std::fs::write(path, text)?;
    log::info!("saved game to slot '{slot}' at tick {}", record.tick);
    Ok(())
}

pub fn load_game(save_dir: &Path, slot: &str) -> Result<SaveRecord, PersistenceError> {
    let path = slot_path(save_dir, slot)?;
    let text = std::fs::read_to_string(path)?;
    let record: SaveRecord = ron::from_str(&text)?;
    let record = record.migrate()?;
    log::info!("loaded game from slot '{slot}' at tick {}", record.tick);
    Ok(record)
}
