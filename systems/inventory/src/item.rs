//! Capabilities every inventory item exposes to its owning inventory.

use std::fmt::Debug;

use wave_shooter_core::{
    AmmoInfo, AnimationId, Command, EntityId, ItemTemplateId, SlotType, SoundId,
};

/// Side-effect channel handed to item hooks.
///
/// Items never touch the world directly; they queue commands that the host
/// applies after the inventory call returns.
#[derive(Debug)]
pub struct ItemContext<'a> {
    owner: EntityId,
    out: &'a mut Vec<Command>,
}

impl<'a> ItemContext<'a> {
    /// Creates a context for hooks running on behalf of `owner`.
    pub fn new(owner: EntityId, out: &'a mut Vec<Command>) -> Self {
        Self { owner, out }
    }

    /// Entity that owns the inventory holding the item.
    #[must_use]
    pub const fn owner(&self) -> EntityId {
        self.owner
    }

    /// Queues fire-and-forget playback of a sound.
    pub fn play_sound(&mut self, sound: &SoundId) {
        self.out.push(Command::PlaySound {
            sound: sound.clone(),
        });
    }

    /// Queues an animation on the owner routed through the named slot.
    pub fn play_animation(&mut self, animation: &AnimationId, slot: &str) {
        self.out.push(Command::PlaySlotAnimation {
            entity: self.owner,
            animation: animation.clone(),
            slot: slot.to_owned(),
        });
    }

    /// Queues a change of the owner's idle pose.
    pub fn update_idle_animation(&mut self, animation: &AnimationId) {
        self.out.push(Command::UpdateIdleAnimation {
            entity: self.owner,
            animation: animation.clone(),
        });
    }
}

/// An item that can occupy an inventory slot.
///
/// Only identity, equip state and the equip/unequip transitions are required;
/// every input hook defaults to doing nothing so simple items implement just
/// what they react to.
pub trait Item: Debug {
    /// Template the item was created from.
    fn template(&self) -> ItemTemplateId;

    /// Whether the item is the active one in its inventory.
    fn is_equipped(&self) -> bool;

    /// Animation the owner plays when the item is equipped.
    fn equip_animation(&self) -> Option<&AnimationId> {
        None
    }

    /// Ammunition carried by the item, if it tracks any.
    fn ammo(&self) -> Option<&AmmoInfo> {
        None
    }

    /// Called when the item becomes the active item.
    fn on_equip(&mut self, ctx: &mut ItemContext<'_>);

    /// Called when the item stops being the active item.
    fn on_unequip(&mut self, ctx: &mut ItemContext<'_>);

    /// Called when fire (or throw, for the throwable slot) is pressed.
    fn on_fire_pressed(&mut self, _ctx: &mut ItemContext<'_>) {}

    /// Called when fire (or throw, for the throwable slot) is released.
    fn on_fire_released(&mut self, _ctx: &mut ItemContext<'_>) {}

    /// Called when ammunition should be restored to full.
    fn on_replenish(&mut self, _ctx: &mut ItemContext<'_>) {}

    /// Called when the player asks to reload.
    fn on_request_reload(&mut self, _infinite_ammo: bool, _ctx: &mut ItemContext<'_>) {}

    /// Called when any in-flight reload should stop.
    fn on_cancel_reload(&mut self, _ctx: &mut ItemContext<'_>) {}
}

/// Creates item instances from templates.
pub trait ItemFactory {
    /// Slot category of the template, or `None` if the template is unknown.
    fn slot_type(&self, template: ItemTemplateId) -> Option<SlotType>;

    /// Spawns a new instance of the template, or `None` if the template is unknown.
    fn instantiate(&self, template: ItemTemplateId) -> Option<Box<dyn Item>>;
}
