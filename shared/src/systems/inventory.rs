//! Inventory/Equipment system (§4.4): add/remove/drop/equip/use, enforcing
//! the weight cap and applying equipped item stats to the owner.

use crate::components::{Equipment, EquipmentSlot, Inventory, InventoryError, ItemStack, Stats};
use crate::ecs::World;
use crate::events::GameEvent;
use crate::types::EntityId;

/// Static definition for an item kind: the stat bonus it grants while
/// equipped, or the one-shot effect it applies when consumed. Items
/// themselves ([`ItemStack`]) only carry an id/quantity/weight -- this
/// definition is looked up by the caller (e.g. from a generated-content
/// table) rather than duplicated onto every stack.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemDef {
    pub equip_slot: Option<EquipmentSlot>,
    pub stat_bonus: StatBonus,
    pub consumable_heal: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StatBonus {
    pub attack: f64,
    pub defense: f64,
    pub magic_power: f64,
    pub magic_defense: f64,
}

pub fn add_item(world: &mut World, owner: EntityId, stack: ItemStack) -> Result<usize, InventoryError> {
    match world.get_component_mut::<Inventory>(owner) {
        Some(inv) => inv.try_add(stack),
        None => Err(InventoryError::Full { capacity: 0 }),
    }
}

/// Removes a stack from a slot and emits an [`GameEvent::ItemDropped`]
/// event (§4.4 "drop loot" on death is the canonical caller).
pub fn drop_item(world: &mut World, owner: EntityId, slot: usize) -> Result<ItemStack, InventoryError> {
    let stack = match world.get_component_mut::<Inventory>(owner) {
        Some(inv) => inv.remove(slot)?,
        None => return Err(InventoryError::EmptySlot { slot }),
    };
    world.events_mut().emit(GameEvent::ItemDropped {
        entity: owner,
        item_name: stack.item_id.clone(),
    });
    Ok(stack)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EquipError {
    #[error("inventory slot {slot} is empty")]
    EmptySlot { slot: usize },
    #[error("item in slot {slot} does not belong to this equipment slot")]
    WrongSlot { slot: usize },
}

/// Equips the item in inventory slot `slot`: records the reference in
/// [`Equipment`] and applies `item_def`'s stat bonus to the owner's
/// [`Stats`]. The referenced item continues to live in the owner's
/// `Inventory` (§3 "each referenced item lives in Inventory"); equipping
/// never removes it from the inventory slot.
///
/// `previous_bonus` is the bonus currently granted by whatever already
/// occupies `equip_slot`, if anything -- `Equipment` only stores an
/// inventory slot index, not the bonus it once applied, so the caller
/// (which looked the old item up to call this in the first place) supplies
/// it here the same way [`unequip_with_bonus`] requires it. Passing the
/// wrong value, or omitting it when something was equipped, leaks or
/// double-applies a stat bonus.
pub fn equip(
    world: &mut World,
    owner: EntityId,
    slot: usize,
    equip_slot: EquipmentSlot,
    previous_bonus: Option<StatBonus>,
    item_def: &ItemDef,
) -> Result<(), EquipError> {
    {
        let inv = world
            .get_component::<Inventory>(owner)
            .ok_or(EquipError::EmptySlot { slot })?;
        if inv.slots.get(slot).and_then(|s| s.as_ref()).is_none() {
            return Err(EquipError::EmptySlot { slot });
        }
    }

    if let Some(bonus) = previous_bonus {
        unequip_with_bonus(world, owner, equip_slot, bonus);
    } else {
        unequip(world, owner, equip_slot);
    }

    if let Some(equipment) = world.get_component_mut::<Equipment>(owner) {
        *equipment.slot_mut(equip_slot) = Some(slot);
    }
    if let Some(stats) = world.get_component_mut::<Stats>(owner) {
        stats.attack += item_def.stat_bonus.attack;
        stats.defense += item_def.stat_bonus.defense;
        stats.magic_power += item_def.stat_bonus.magic_power;
        stats.magic_defense += item_def.stat_bonus.magic_defense;
    }
    Ok(())
}

/// Removes whatever is currently equipped in `equip_slot`, reverting its
/// stat bonus. No-op if nothing is equipped there; the caller supplies the
/// bonus to revert since `Equipment` only stores the inventory slot index.
pub fn unequip_with_bonus(world: &mut World, owner: EntityId, equip_slot: EquipmentSlot, bonus: StatBonus) {
    let was_equipped = world
        .get_component_mut::<Equipment>(owner)
        .map(|equipment| equipment.slot_mut(equip_slot).take().is_some())
        .unwrap_or(false);

    if was_equipped {
        if let Some(stats) = world.get_component_mut::<Stats>(owner) {
            stats.attack -= bonus.attack;
            stats.defense -= bonus.defense;
            stats.magic_power -= bonus.magic_power;
            stats.magic_defense -= bonus.magic_defense;
        }
    }
}

fn unequip(world: &mut World, owner: EntityId, equip_slot: EquipmentSlot) {
    if let Some(equipment) = world.get_component_mut::<Equipment>(owner) {
        equipment.slot_mut(equip_slot).take();
    }
}

/// Applies a consumable's effect then removes one charge from the stack,
/// dropping the stack entirely once its quantity reaches zero (§4.4
/// "use-consumable applies effect then removes one charge").
pub fn use_consumable(
    world: &mut World,
    owner: EntityId,
    slot: usize,
    item_def: &ItemDef,
) -> Result<(), InventoryError> {
    if let Some(heal) = item_def.consumable_heal {
        if let Some(health) = world.get_component_mut::<crate::components::Health>(owner) {
            health.apply_delta(-heal);
        }
    }

    let inv = world
        .get_component_mut::<Inventory>(owner)
        .ok_or(InventoryError::EmptySlot { slot })?;
    let stack = inv.slots.get_mut(slot).and_then(|s| s.as_mut());
    match stack {
        Some(s) if s.quantity > 1 => {
            s.quantity -= 1;
            Ok(())
        }
        Some(_) => {
            inv.slots[slot] = None;
            Ok(())
        }
        None => Err(InventoryError::EmptySlot { slot }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Health;

    #[test]
    fn add_rejects_over_weight() {
        let mut world = World::new(1);
        let owner = world.create_entity();
        world.add_component(owner, Inventory::new(4, 10.0)).unwrap();
        let result = add_item(
            &mut world,
            owner,
            ItemStack {
                item_id: "boulder".into(),
                quantity: 1,
                weight: 20.0,
            },
        );
        assert!(matches!(result, Err(InventoryError::OverWeight { .. })));
    }

    #[test]
    fn equip_applies_stat_bonus() {
        let mut world = World::new(1);
        let owner = world.create_entity();
        world.add_component(owner, Inventory::new(4, 10.0)).unwrap();
        world.add_component(owner, Equipment::default()).unwrap();
        world.add_component(owner, Stats::new(5.0, 5.0, 5.0, 5.0)).unwrap();
        let slot = add_item(
            &mut world,
            owner,
            ItemStack {
                item_id: "sword".into(),
                quantity: 1,
                weight: 2.0,
            },
        )
        .unwrap();

        let def = ItemDef {
            equip_slot: Some(EquipmentSlot::Weapon),
            stat_bonus: StatBonus {
                attack: 10.0,
                ..Default::default()
            },
            consumable_heal: None,
        };
        equip(&mut world, owner, slot, EquipmentSlot::Weapon, None, &def).unwrap();
        let stats = world.get_component::<Stats>(owner).unwrap();
        assert_eq!(stats.attack, 15.0);
    }

    #[test]
    fn re_equip_reverts_previous_bonus_before_applying_new() {
        let mut world = World::new(1);
        let owner = world.create_entity();
        world.add_component(owner, Inventory::new(4, 10.0)).unwrap();
        world.add_component(owner, Equipment::default()).unwrap();
        world.add_component(owner, Stats::new(5.0, 5.0, 5.0, 5.0)).unwrap();

        let dagger_slot = add_item(
            &mut world,
            owner,
            ItemStack { item_id: "dagger".into(), quantity: 1, weight: 1.0 },
        )
        .unwrap();
        let sword_slot = add_item(
            &mut world,
            owner,
            ItemStack { item_id: "sword".into(), quantity: 1, weight: 2.0 },
        )
        .unwrap();

        let dagger_def = ItemDef {
            equip_slot: Some(EquipmentSlot::Weapon),
            stat_bonus: StatBonus { attack: 3.0, ..Default::default() },
            consumable_heal: None,
        };
        let sword_def = ItemDef {
            equip_slot: Some(EquipmentSlot::Weapon),
            stat_bonus: StatBonus { attack: 10.0, ..Default::default() },
            consumable_heal: None,
        };

        equip(&mut world, owner, dagger_slot, EquipmentSlot::Weapon, None, &dagger_def).unwrap();
        equip(
            &mut world,
            owner,
            sword_slot,
            EquipmentSlot::Weapon,
            Some(dagger_def.stat_bonus),
            &sword_def,
        )
        .unwrap();

        let stats = world.get_component::<Stats>(owner).unwrap();
        assert_eq!(stats.attack, 15.0);
    }

    #[test]
    fn use_consumable_heals_and_removes_charge() {
        let mut world = World::new(1);
        let owner = world.create_entity();
        world.add_component(owner, Inventory::new(4, 10.0)).unwrap();
        world.add_component(owner, Health { current: 5.0, max: 20.0 }).unwrap();
        let slot = add_item(
            &mut world,
            owner,
            ItemStack {
                item_id: "potion".into(),
                quantity: 2,
                weight: 0.5,
            },
        )
        .unwrap();

        let def = ItemDef {
            equip_slot: None,
            stat_bonus: StatBonus::default(),
            consumable_heal: Some(10.0),
        };
        use_consumable(&mut world, owner, slot, &def).unwrap();
        assert_eq!(world.get_component::<Health>(owner).unwrap().current, 15.0);
        assert_eq!(
            world
                .get_component::<Inventory>(owner)
                .unwrap()
                .slots[slot]
                .as_ref()
                .unwrap()
                .quantity,
            1
        );
    }
}
