//! Gameplay systems (§4.4): movement, collision, combat, AI, progression,
//! inventory. Each has a single responsibility and reads/writes a bounded
//! component set; communication between systems is only through components.

pub mod ai;
pub mod collision;
pub mod combat;
pub mod inventory;
pub mod movement;
pub mod progression;

pub use ai::AiSystem;
pub use collision::CollisionSystem;
pub use combat::{resolve_attack, AttackRequest, DeathSweepSystem};
pub use inventory::{add_item, drop_item, equip, unequip_with_bonus, EquipError, ItemDef, StatBonus};
pub use movement::MovementSystem;
pub use progression::{award_xp, default_xp_curve, LevelUpScaling};
