//! Pluggable content generators: entities, items, spells, quests (§4.2).
//!
//! Every concrete generator implements [`Generator`]; callers pass a
//! [`GenerationParams`] bag (difficulty, depth, genre, and free-form named
//! options) plus an RNG already split for that generator's kind tag.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::procgen::genre::Genre;
use crate::rng::SeededRng;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OptionValue {
    Int(i64),
    Text(String),
    Bool(bool),
}

impl OptionValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            OptionValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            OptionValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

/// Free-form options bag, named keys enumerated per generator (§4.2, e.g.
/// `{"count": int, "type": "weapon"}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Options {
    values: HashMap<String, OptionValue>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: OptionValue) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.values.get(key)
    }

    pub fn int_or(&self, key: &str, default: i64) -> i64 {
        self.get(key).and_then(OptionValue::as_int).unwrap_or(default)
    }

    pub fn text_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).and_then(OptionValue::as_text).unwrap_or(default)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub difficulty: u32,
    pub depth: u32,
    pub genre: Genre,
    /// Optional second genre to mix with `genre`, paired with the primary
    /// genre's weight in `[0, 1]` (§4.2 "a blended genre mixes two presets
    /// by weight"). `None` generates purely from `genre`.
    pub blend: Option<(Genre, f64)>,
    pub options: Options,
}

impl GenerationParams {
    /// Resolves which genre's tables a single generated artifact draws
    /// from. Unblended params never touch `rng` so existing seeded
    /// generation is untouched; a blend draws one coin flip per artifact
    /// from the caller's RNG stream, keeping the pick deterministic.
    fn resolved_genre(&self, rng: &mut SeededRng) -> Genre {
        match self.blend {
            Some((secondary, weight_primary)) => {
                let roll = rng.gen_range_f64(0.0, 1.0);
                *Genre::blend_pick(&self.genre, &secondary, weight_primary, roll)
            }
            None => self.genre,
        }
    }
}

/// One generated piece of content: an entity archetype, item, spell, or
/// quest, identified loosely by `kind` + free-form `fields` so a single
/// `Artifact` vocabulary covers every generator in §4.2 without forcing an
/// enum every caller must match exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub kind: String,
    pub name: String,
    pub fields: HashMap<String, OptionValue>,
}

impl Artifact {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            fields: HashMap::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: OptionValue) -> Self {
        self.fields.insert(key.into(), value);
        self
    }
}

/// `Generate(params, rng) -> []Artifact` (§4.2).
pub trait Generator {
    /// Kind tag this generator's RNG stream must be split under, e.g.
    /// `"entity"`, `"magic:spell"`.
    fn kind_tag(&self) -> &'static str;

    fn generate(&self, params: &GenerationParams, rng: &mut SeededRng) -> Vec<Artifact>;
}

pub struct EntityGenerator;

impl Generator for EntityGenerator {
    fn kind_tag(&self) -> &'static str {
        "entity"
    }

    fn generate(&self, params: &GenerationParams, rng: &mut SeededRng) -> Vec<Artifact> {
        let count = params.options.int_or("count", 1).max(0) as u32;
        (0..count)
            .filter_map(|i| {
                let genre = params.resolved_genre(rng);
                let archetype = rng.choose(genre.monster_archetypes())?;
                let hp = 10.0 + (params.difficulty as f64) * 4.0 + rng.gen_range_f64(0.0, 6.0);
                Some(
                    Artifact::new("entity", format!("{archetype}_{i}"))
                        .with_field("archetype", OptionValue::Text((*archetype).to_string()))
                        .with_field("health", OptionValue::Int(hp as i64))
                        .with_field("depth", OptionValue::Int(params.depth as i64)),
                )
            })
            .collect()
    }
}

pub struct ItemGenerator;

impl Generator for ItemGenerator {
    fn kind_tag(&self) -> &'static str {
        "item"
    }

    fn generate(&self, params: &GenerationParams, rng: &mut SeededRng) -> Vec<Artifact> {
        let count = params.options.int_or("count", 1).max(0) as u32;
        let item_type = params.options.text_or("type", "weapon").to_string();
        (0..count)
            .filter_map(|_| {
                let genre = params.resolved_genre(rng);
                let prefix = rng.choose(genre.item_naming_table())?;
                let power = 1 + params.difficulty + rng.gen_range_i32(0, 4) as u32;
                Some(
                    Artifact::new("item", format!("{prefix} {item_type}"))
                        .with_field("item_type", OptionValue::Text(item_type.clone()))
                        .with_field("power", OptionValue::Int(power as i64)),
                )
            })
            .collect()
    }
}

pub struct SpellGenerator;

impl Generator for SpellGenerator {
    fn kind_tag(&self) -> &'static str {
        "magic:spell"
    }

    fn generate(&self, params: &GenerationParams, rng: &mut SeededRng) -> Vec<Artifact> {
        let count = params.options.int_or("count", 1).max(0) as u32;
        (0..count)
            .filter_map(|i| {
                let genre = params.resolved_genre(rng);
                let school = rng.choose(genre.spell_schools())?;
                let power = 5 + params.difficulty * 2 + rng.gen_range_i32(0, 5) as u32;
                Some(
                    Artifact::new("spell", format!("{school}_spell_{i}"))
                        .with_field("school", OptionValue::Text((*school).to_string()))
                        .with_field("power", OptionValue::Int(power as i64)),
                )
            })
            .collect()
    }
}

pub struct QuestGenerator;

impl Generator for QuestGenerator {
    fn kind_tag(&self) -> &'static str {
        "quest"
    }

    fn generate(&self, params: &GenerationParams, rng: &mut SeededRng) -> Vec<Artifact> {
        let templates = ["hunt", "fetch", "escort", "clear"];
        let template = rng.choose(&templates).copied().unwrap_or("hunt");
        let reward = 50 + params.difficulty * 25 + rng.gen_range_i32(0, 20) as u32;
        vec![Artifact::new("quest", format!("{template}_{}", params.depth))
            .with_field("template", OptionValue::Text(template.to_string()))
            .with_field("reward_gold", OptionValue::Int(reward as i64))]
    }
}
