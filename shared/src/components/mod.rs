//! Core components (§3). Each is pure data with a string type tag and no
//! behavior; invariants are enforced by constructors/mutators rather than by
//! systems reaching into raw fields, so a component can never be observed in
//! an inconsistent state between ticks.

use serde::{Deserialize, Serialize};

use crate::impl_component;
use crate::types::{EntityId, TeamId};

/// World-space position. Invariant: finite; callers clamp to terrain bounds
/// (the terrain grid, not this component, owns the bounds).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}
impl_component!(Position, "position");

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        debug_assert!(x.is_finite() && y.is_finite(), "non-finite position");
        Self { x, y }
    }
}

/// Facing direction derived by the Movement system from velocity (§4.4).
/// Not part of the spec's core component table but required to persist the
/// "last facing when stationary" invariant across ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}
impl Default for Direction {
    fn default() -> Self {
        Direction::South
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Facing {
    pub direction: Direction,
}
impl_component!(Facing, "facing");

/// Velocity plus friction. Invariant: `|v|` is clamped to a per-entity speed
/// cap every frame by the Movement system, not by this component itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub vx: f64,
    pub vy: f64,
    pub friction: f64,
    pub speed_cap: f64,
}
impl_component!(Velocity, "velocity");

impl Velocity {
    pub fn new(vx: f64, vy: f64, friction: f64, speed_cap: f64) -> Self {
        Self {
            vx,
            vy,
            friction: friction.clamp(0.0, 1.0),
            speed_cap,
        }
    }

    pub fn magnitude(&self) -> f64 {
        (self.vx * self.vx + self.vy * self.vy).sqrt()
    }

    /// Clamps `|v|` to `speed_cap`, preserving direction.
    pub fn clamp_to_speed_cap(&mut self) {
        let mag = self.magnitude();
        if mag > self.speed_cap && mag > 0.0 {
            let scale = self.speed_cap / mag;
            self.vx *= scale;
            self.vy *= scale;
        }
    }
}

/// Marker component: present iff `Health.current == 0`. Absorbing state for
/// the combat state machine (§4.4 "Combat-on-entity: terminal=Dead is
/// absorbing").
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dead;
impl_component!(Dead, "dead");

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub current: f64,
    pub max: f64,
}
impl_component!(Health, "health");

impl Health {
    pub fn new(max: f64) -> Self {
        Self { current: max, max }
    }

    /// Applies damage (or healing, if negative), clamping to `[0, max]`.
    /// Returns `true` if this call brought `current` to exactly zero (the
    /// caller is responsible for attaching [`Dead`] and emitting the death
    /// event -- see `systems::combat`).
    pub fn apply_delta(&mut self, delta: f64) -> bool {
        let was_alive = self.current > 0.0;
        self.current = (self.current - delta).clamp(0.0, self.max);
        was_alive && self.current == 0.0
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }

    pub fn fraction(&self) -> f64 {
        if self.max <= 0.0 {
            0.0
        } else {
            self.current / self.max
        }
    }
}

/// Invariant: all fields non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub attack: f64,
    pub defense: f64,
    pub magic_power: f64,
    pub magic_defense: f64,
}
impl_component!(Stats, "stats");

impl Stats {
    pub fn new(attack: f64, defense: f64, magic_power: f64, magic_defense: f64) -> Self {
        Self {
            attack: attack.max(0.0),
            defense: defense.max(0.0),
            magic_power: magic_power.max(0.0),
            magic_defense: magic_defense.max(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
}
impl_component!(Team, "team");

impl Team {
    pub fn is_friendly(&self, other: &Team) -> bool {
        self.id == other.id
    }
}

/// Axis-aligned bounding box half-extents plus a collision layer bitmask.
/// Invariant: immutable once set (§3) -- there is no `set_half_extents`;
/// replacing a Collider means removing and re-adding the component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    half_width: f64,
    half_height: f64,
    pub layer_mask: u32,
}
impl_component!(Collider, "collider");

impl Collider {
    pub fn new(half_width: f64, half_height: f64, layer_mask: u32) -> Self {
        Self {
            half_width: half_width.max(0.0),
            half_height: half_height.max(0.0),
            layer_mask,
        }
    }

    pub fn half_width(&self) -> f64 {
        self.half_width
    }

    pub fn half_height(&self) -> f64 {
        self.half_height
    }

    pub fn overlaps_on_layer(&self, other: &Collider) -> bool {
        (self.layer_mask & other.layer_mask) != 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item_id: String,
    pub quantity: u32,
    pub weight: f64,
}

/// Ordered inventory slots plus gold and a weight cap. Invariant:
/// `sum(weight) <= max_weight`, enforced by [`Inventory::try_add`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub slots: Vec<Option<ItemStack>>,
    pub gold: u64,
    pub max_weight: f64,
}
impl_component!(Inventory, "inventory");

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InventoryError {
    #[error("inventory is full ({capacity} slots)")]
    Full { capacity: usize },
    #[error("adding {added:.2} weight would exceed the cap of {max:.2}")]
    OverWeight { added: f64, max: f64 },
    #[error("slot {slot} is empty")]
    EmptySlot { slot: usize },
}

impl Inventory {
    pub fn new(capacity: usize, max_weight: f64) -> Self {
        Self {
            slots: vec![None; capacity],
            gold: 0,
            max_weight,
        }
    }

    pub fn total_weight(&self) -> f64 {
        self.slots
            .iter()
            .flatten()
            .map(|s| s.weight)
            .sum()
    }

    /// Adds a stack to the first empty slot. Rejects the operation
    /// (§7 resource-exhaustion: "never panic") rather than violating the
    /// weight-cap invariant.
    pub fn try_add(&mut self, stack: ItemStack) -> Result<usize, InventoryError> {
        if self.total_weight() + stack.weight > self.max_weight {
            return Err(InventoryError::OverWeight {
                added: stack.weight,
                max: self.max_weight,
            });
        }
        let slot = self
            .slots
            .iter()
            .position(|s| s.is_none())
            .ok_or(InventoryError::Full {
                capacity: self.slots.len(),
            })?;
        self.slots[slot] = Some(stack);
        Ok(slot)
    }

    pub fn remove(&mut self, slot: usize) -> Result<ItemStack, InventoryError> {
        self.slots
            .get_mut(slot)
            .and_then(|s| s.take())
            .ok_or(InventoryError::EmptySlot { slot })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipmentSlot {
    Weapon,
    Armor,
    Accessory,
}

/// Maps equipment slots to an inventory slot index. Invariant: every
/// referenced item lives in the owner's [`Inventory`] (enforced by
/// `systems::inventory::equip`, not representable in this struct alone since
/// it spans two components).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub weapon: Option<usize>,
    pub armor: Option<usize>,
    pub accessory: Option<usize>,
}
impl_component!(Equipment, "equipment");

impl Equipment {
    pub fn slot_mut(&mut self, slot: EquipmentSlot) -> &mut Option<usize> {
        match slot {
            EquipmentSlot::Weapon => &mut self.weapon,
            EquipmentSlot::Armor => &mut self.armor,
            EquipmentSlot::Accessory => &mut self.accessory,
        }
    }
}

/// Invariant: `level >= 1`; `required_xp = curve(level)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub level: u32,
    pub current_xp: u64,
    pub required_xp: u64,
    pub skill_points: u32,
}
impl_component!(Experience, "experience");

impl Experience {
    pub fn new(curve: impl Fn(u32) -> u64) -> Self {
        Self {
            level: 1,
            current_xp: 0,
            required_xp: curve(1),
            skill_points: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiState {
    Idle,
    Detect,
    Chase,
    Attack,
    Flee,
    Return,
}

/// FSM state plus a weak reference to the current target (§9 "Pointer graphs
/// and back-references... handle as weak references by entity id"). The
/// target must be validated on every dereference: see
/// `systems::ai::resolve_target`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ai {
    pub state: AiState,
    pub target: Option<EntityId>,
    pub spawn_x: f64,
    pub spawn_y: f64,
    pub detection_radius: f64,
    pub attack_range: f64,
    pub flee_health_fraction: f64,
    pub max_chase_distance: f64,
    pub decision_interval: f64,
    pub time_since_decision: f64,
}
impl_component!(Ai, "ai");

impl Ai {
    /// Initial state is always [`AiState::Idle`] (§4.4).
    pub fn new(spawn_x: f64, spawn_y: f64) -> Self {
        Self {
            state: AiState::Idle,
            target: None,
            spawn_x,
            spawn_y,
            detection_radius: 6.0,
            attack_range: 1.25,
            flee_health_fraction: 0.2,
            max_chase_distance: 12.0,
            decision_interval: 0.5,
            time_since_decision: 0.0,
        }
    }
}

/// Server-only: the authoritative player this networked entity belongs to,
/// and the last input sequence number the server has acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub authoritative_player_id: u64,
    pub last_acked_input_seq: u16,
}
impl_component!(Network, "network");

/// Invariant: `lifetime > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub owner: EntityId,
    pub damage: f64,
    pub lifetime: f64,
    pub speed: f64,
}
impl_component!(Projectile, "projectile");
