//! Gameplay events emitted by systems, consumed by the external audio/UI
//! collaborators (§6) and by other systems that observe outcomes indirectly
//! (e.g. Progression reacting to a death event) without reaching into each
//! other's private state (§3).

use crate::types::{EntityId, TeamId};

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Damage {
        target: EntityId,
        amount: f64,
        attacker: Option<EntityId>,
        was_crit: bool,
    },
    Death {
        entity: EntityId,
        team: TeamId,
        killer: Option<EntityId>,
    },
    SpellCast {
        caster: EntityId,
        spell: String,
    },
    LevelUp {
        entity: EntityId,
        new_level: u32,
    },
    ItemDropped {
        entity: EntityId,
        item_name: String,
    },
}

/// In-process fan-out of gameplay events to any number of subscribers
/// (audio, UI, analytics). A `Vec`-backed bus is sufficient here: events are
/// drained once per tick by the caller via [`EventBus::drain`], matching
/// "the core emits; audio subscribes" (§6) without the core depending on any
/// specific collaborator.
#[derive(Debug, Default)]
pub struct EventBus {
    pending: Vec<GameEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.pending.push(event);
    }

    pub fn drain(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending)
    }
}
