#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Five-slot inventory that routes player input to the equipped item.
//!
//! Each [`Inventory`] holds at most one item per [`Slot`]. Exactly one slot is
//! the equipped slot; fire and reload input reach only its item, throw input
//! always reaches the throwable slot, and reload cancellation and ammo
//! replenishment are broadcast to every occupied slot. Item side effects are
//! returned as [`Command`] values for the host to apply.

pub mod catalog;
pub mod item;

use thiserror::Error;
use tracing::{debug, error};
use wave_shooter_core::{Command, EntityId, ItemTemplateId, Slot, SlotType, SLOT_COUNT};

pub use catalog::{ItemAnimations, ItemBlueprint, ItemCatalog, ItemSounds, StandardItem};
pub use item::{Item, ItemContext, ItemFactory};

/// Animation slot used for equip animations triggered by swaps.
pub const UPPER_BODY_SLOT: &str = "UpperBodySlot";

/// Reasons an inventory operation could not take effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum InventoryError {
    /// The item factory does not know the requested template.
    #[error("item template {} is not known to the item factory", .0.get())]
    UnknownTemplate(ItemTemplateId),
}

/// Equipment owned by a single entity.
#[derive(Debug)]
pub struct Inventory {
    owner: EntityId,
    slots: [Option<Box<dyn Item>>; SLOT_COUNT],
    equipped_slot: Slot,
    last_equipped_weapon: Slot,
    last_equipped_gadget: Slot,
    infinite_ammo: bool,
}

impl Inventory {
    /// Creates an empty inventory for `owner`.
    #[must_use]
    pub fn new(owner: EntityId) -> Self {
        Self {
            owner,
            slots: Default::default(),
            equipped_slot: Slot::PrimaryWeapon,
            last_equipped_weapon: Slot::PrimaryWeapon,
            last_equipped_gadget: Slot::PrimaryGadget,
            infinite_ammo: false,
        }
    }

    /// Entity that owns the inventory.
    #[must_use]
    pub const fn owner(&self) -> EntityId {
        self.owner
    }

    /// Whether reloads refill without spending magazines.
    #[must_use]
    pub const fn infinite_ammo(&self) -> bool {
        self.infinite_ammo
    }

    /// Enables or disables infinite ammunition for reloads.
    pub fn set_infinite_ammo(&mut self, infinite_ammo: bool) {
        self.infinite_ammo = infinite_ammo;
    }

    /// Items in slot order; empty slots are `None`.
    #[must_use]
    pub fn loadout_items(&self) -> [Option<&dyn Item>; SLOT_COUNT] {
        std::array::from_fn(|index| self.slots[index].as_deref())
    }

    /// Slot currently routed fire and reload input.
    #[must_use]
    pub const fn equipped_slot(&self) -> Slot {
        self.equipped_slot
    }

    /// Most recently equipped weapon slot.
    #[must_use]
    pub const fn last_equipped_weapon_slot(&self) -> Slot {
        self.last_equipped_weapon
    }

    /// Most recently equipped gadget slot.
    #[must_use]
    pub const fn last_equipped_gadget_slot(&self) -> Slot {
        self.last_equipped_gadget
    }

    /// Item in the equipped slot.
    #[must_use]
    pub fn selected_item(&self) -> Option<&dyn Item> {
        self.item(self.equipped_slot)
    }

    /// Item occupying `slot`.
    #[must_use]
    pub fn item(&self, slot: Slot) -> Option<&dyn Item> {
        self.slots[slot.index()].as_deref()
    }

    /// Item at a raw slot index. Out-of-range indices are reported and yield `None`.
    #[must_use]
    pub fn item_at(&self, index: usize) -> Option<&dyn Item> {
        match Slot::try_from(index) {
            Ok(slot) => self.item(slot),
            Err(invalid) => {
                error!(owner = self.owner.get(), %invalid, "invalid inventory slot index");
                None
            }
        }
    }

    /// Whether an instance of `template` occupies any slot.
    #[must_use]
    pub fn is_item_in_inventory(&self, template: ItemTemplateId) -> bool {
        self.slots
            .iter()
            .flatten()
            .any(|item| item.template() == template)
    }

    /// Spawns an instance of `template` into `slot`, destroying the previous occupant.
    ///
    /// The new item is not equipped.
    pub fn add_item<F>(
        &mut self,
        slot: Slot,
        template: ItemTemplateId,
        factory: &F,
    ) -> Result<(), InventoryError>
    where
        F: ItemFactory + ?Sized,
    {
        let item = factory
            .instantiate(template)
            .ok_or(InventoryError::UnknownTemplate(template))?;

        if let Some(previous) = self.slots[slot.index()].replace(item) {
            debug!(
                owner = self.owner.get(),
                ?slot,
                replaced = previous.template().get(),
                "destroying replaced item"
            );
        }
        Ok(())
    }

    /// Makes the item in `slot` the active one and requests its equip animation.
    ///
    /// Returns `false` without side effects when the slot is empty or is
    /// already the equipped slot with an equipped item.
    pub fn equip_item(&mut self, slot: Slot, animation_slot: &str, out: &mut Vec<Command>) -> bool {
        if self.slots[slot.index()].is_none() {
            return false;
        }
        if slot == self.equipped_slot && self.item(slot).is_some_and(|item| item.is_equipped()) {
            return false;
        }

        self.cancel_reload(out);
        self.unequip_all(out);

        self.equipped_slot = slot;
        if slot.is_weapon() {
            self.last_equipped_weapon = slot;
        } else if slot.is_gadget() {
            self.last_equipped_gadget = slot;
        }

        let owner = self.owner;
        if let Some(item) = self.slots[slot.index()].as_mut() {
            item.on_equip(&mut ItemContext::new(owner, out));
            match item.equip_animation() {
                Some(animation) => out.push(Command::PlaySlotAnimation {
                    entity: owner,
                    animation: animation.clone(),
                    slot: animation_slot.to_owned(),
                }),
                None => debug!(owner = owner.get(), ?slot, "item has no equip animation"),
            }
        }
        true
    }

    /// Adds `template` into the slot its type prefers.
    ///
    /// Weapons and gadgets take the first empty slot of their pair, falling
    /// back to the last equipped one; throwables always take the throwable
    /// slot. Returns `Ok(false)` without changes when the template is already
    /// carried.
    pub fn swap_item<F>(
        &mut self,
        template: ItemTemplateId,
        should_equip: bool,
        factory: &F,
        out: &mut Vec<Command>,
    ) -> Result<bool, InventoryError>
    where
        F: ItemFactory + ?Sized,
    {
        if self.is_item_in_inventory(template) {
            return Ok(false);
        }

        let slot_type = factory
            .slot_type(template)
            .ok_or(InventoryError::UnknownTemplate(template))?;
        let slot = match slot_type {
            SlotType::Weapon => self.pick_empty_weapon_slot(),
            SlotType::Gadget => self.pick_empty_gadget_slot(),
            SlotType::Throwable => Slot::Throwable,
        };

        self.add_item(slot, template, factory)?;

        let target = if should_equip && slot != Slot::Throwable {
            slot
        } else {
            self.equipped_slot
        };
        let _ = self.equip_item(target, UPPER_BODY_SLOT, out);
        Ok(true)
    }

    /// Forwards a fire press to the equipped item.
    pub fn on_fire_pressed(&mut self, out: &mut Vec<Command>) {
        self.send(self.equipped_slot, out, |item, ctx| item.on_fire_pressed(ctx));
    }

    /// Forwards a fire release to the equipped item.
    pub fn on_fire_released(&mut self, out: &mut Vec<Command>) {
        self.send(self.equipped_slot, out, |item, ctx| item.on_fire_released(ctx));
    }

    /// Forwards a throw press to the throwable slot, whatever is equipped.
    pub fn on_throw_pressed(&mut self, out: &mut Vec<Command>) {
        self.send(Slot::Throwable, out, |item, ctx| item.on_fire_pressed(ctx));
    }

    /// Forwards a throw release to the throwable slot, whatever is equipped.
    pub fn on_throw_released(&mut self, out: &mut Vec<Command>) {
        self.send(Slot::Throwable, out, |item, ctx| item.on_fire_released(ctx));
    }

    /// Asks the equipped item to reload.
    pub fn reload_selected(&mut self, out: &mut Vec<Command>) {
        let infinite_ammo = self.infinite_ammo;
        self.send(self.equipped_slot, out, |item, ctx| {
            item.on_request_reload(infinite_ammo, ctx);
        });
    }

    /// Cancels reloads on every item, not just the equipped one.
    pub fn cancel_reload(&mut self, out: &mut Vec<Command>) {
        self.broadcast(out, |item, ctx| item.on_cancel_reload(ctx));
    }

    /// Restores ammunition on every item.
    pub fn replenish_all_ammo(&mut self, out: &mut Vec<Command>) {
        self.broadcast(out, |item, ctx| item.on_replenish(ctx));
    }

    /// Unequips and destroys every item. Used when the owner leaves play.
    pub fn destroy_items(&mut self, out: &mut Vec<Command>) {
        self.unequip_all(out);
        for slot in self.slots.iter_mut().rev() {
            if let Some(item) = slot.take() {
                debug!(
                    owner = self.owner.get(),
                    template = item.template().get(),
                    "destroying item"
                );
            }
        }
    }

    fn unequip_all(&mut self, out: &mut Vec<Command>) {
        self.broadcast(out, |item, ctx| item.on_unequip(ctx));
    }

    fn pick_empty_weapon_slot(&self) -> Slot {
        self.pick_empty_slot(
            [Slot::PrimaryWeapon, Slot::SecondaryWeapon],
            self.last_equipped_weapon,
        )
    }

    fn pick_empty_gadget_slot(&self) -> Slot {
        self.pick_empty_slot(
            [Slot::PrimaryGadget, Slot::SecondaryGadget],
            self.last_equipped_gadget,
        )
    }

    fn pick_empty_slot(&self, candidates: [Slot; 2], fallback: Slot) -> Slot {
        candidates
            .into_iter()
            .find(|slot| self.slots[slot.index()].is_none())
            .unwrap_or(fallback)
    }

    fn send(
        &mut self,
        slot: Slot,
        out: &mut Vec<Command>,
        hook: impl FnOnce(&mut dyn Item, &mut ItemContext<'_>),
    ) {
        let owner = self.owner;
        if let Some(item) = self.slots[slot.index()].as_mut() {
            hook(item.as_mut(), &mut ItemContext::new(owner, out));
        }
    }

    fn broadcast(
        &mut self,
        out: &mut Vec<Command>,
        mut hook: impl FnMut(&mut dyn Item, &mut ItemContext<'_>),
    ) {
        let mut ctx = ItemContext::new(self.owner, out);
        for item in self.slots.iter_mut().flatten() {
            hook(item.as_mut(), &mut ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Dummy {
        template: ItemTemplateId,
    }

    impl Item for Dummy {
        fn template(&self) -> ItemTemplateId {
            self.template
        }

        fn is_equipped(&self) -> bool {
            false
        }

        fn on_equip(&mut self, _ctx: &mut ItemContext<'_>) {}

        fn on_unequip(&mut self, _ctx: &mut ItemContext<'_>) {}
    }

    struct DummyFactory;

    impl ItemFactory for DummyFactory {
        fn slot_type(&self, template: ItemTemplateId) -> Option<SlotType> {
            match template.get() {
                0..=9 => Some(SlotType::Weapon),
                10..=19 => Some(SlotType::Gadget),
                20..=29 => Some(SlotType::Throwable),
                _ => None,
            }
        }

        fn instantiate(&self, template: ItemTemplateId) -> Option<Box<dyn Item>> {
            let _ = self.slot_type(template)?;
            Some(Box::new(Dummy { template }))
        }
    }

    #[test]
    fn weapon_slots_fill_in_order_then_fall_back() {
        let mut inventory = Inventory::new(EntityId::new(1));
        assert_eq!(inventory.pick_empty_weapon_slot(), Slot::PrimaryWeapon);

        inventory
            .add_item(Slot::PrimaryWeapon, ItemTemplateId::new(1), &DummyFactory)
            .expect("known template");
        assert_eq!(inventory.pick_empty_weapon_slot(), Slot::SecondaryWeapon);

        inventory
            .add_item(Slot::SecondaryWeapon, ItemTemplateId::new(2), &DummyFactory)
            .expect("known template");
        inventory.last_equipped_weapon = Slot::SecondaryWeapon;
        assert_eq!(inventory.pick_empty_weapon_slot(), Slot::SecondaryWeapon);
    }

    #[test]
    fn gadget_slots_fill_in_order_then_fall_back() {
        let mut inventory = Inventory::new(EntityId::new(1));
        inventory
            .add_item(Slot::SecondaryGadget, ItemTemplateId::new(11), &DummyFactory)
            .expect("known template");
        assert_eq!(inventory.pick_empty_gadget_slot(), Slot::PrimaryGadget);

        inventory
            .add_item(Slot::PrimaryGadget, ItemTemplateId::new(12), &DummyFactory)
            .expect("known template");
        assert_eq!(inventory.pick_empty_gadget_slot(), Slot::PrimaryGadget);
    }

    #[test]
    fn invalid_index_reports_and_yields_nothing() {
        let mut inventory = Inventory::new(EntityId::new(1));
        inventory
            .add_item(Slot::SecondaryGadget, ItemTemplateId::new(11), &DummyFactory)
            .expect("known template");

        assert!(inventory.item_at(4).is_some());
        assert!(inventory.item_at(5).is_none());
        assert!(inventory.item_at(usize::MAX).is_none());
    }

    #[test]
    fn unknown_templates_are_rejected() {
        let mut inventory = Inventory::new(EntityId::new(1));
        let unknown = ItemTemplateId::new(99);
        let mut out = Vec::new();

        assert_eq!(
            inventory.add_item(Slot::PrimaryWeapon, unknown, &DummyFactory),
            Err(InventoryError::UnknownTemplate(unknown))
        );
        assert_eq!(
            inventory.swap_item(unknown, true, &DummyFactory, &mut out),
            Err(InventoryError::UnknownTemplate(unknown))
        );
        assert!(inventory.loadout_items().iter().all(Option::is_none));
        assert!(out.is_empty());
    }
}
