//! Data-driven item definitions and the standard item built from them.

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::debug;
use wave_shooter_core::{
    AmmoInfo, AnimationId, ItemTemplateId, ReloadOutcome, SlotType, SoundId,
};

use crate::{Item, ItemContext, ItemFactory, UPPER_BODY_SLOT};

/// Animations an item asks its owner to play.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ItemAnimations {
    /// Played on the owner when the item is equipped.
    pub character_equip: Option<AnimationId>,
    /// Idle pose the owner adopts while the item is equipped.
    pub character_idle: Option<AnimationId>,
    /// Played on the owner when a reload succeeds.
    pub character_reload: Option<AnimationId>,
}

/// Sounds an item plays in reaction to input.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ItemSounds {
    /// Played for every shot.
    pub fire: Option<SoundId>,
    /// Played when a magazine is loaded.
    pub reload: Option<SoundId>,
    /// Played when the item is equipped.
    pub equip: Option<SoundId>,
    /// Played when the item is put away.
    pub unequip: Option<SoundId>,
    /// Played when firing or reloading with nothing left.
    pub empty_magazine: Option<SoundId>,
}

/// Static definition of an item template.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ItemBlueprint {
    /// Identifier of the template.
    pub template: ItemTemplateId,
    /// Display name.
    pub name: String,
    /// Slot category the item belongs in.
    pub slot_type: SlotType,
    /// Ammunition the item starts with.
    #[serde(default)]
    pub ammo: AmmoInfo,
    /// Animations requested by the item.
    #[serde(default)]
    pub animations: ItemAnimations,
    /// Sounds played by the item.
    #[serde(default)]
    pub sounds: ItemSounds,
}

impl ItemBlueprint {
    /// Creates a blueprint with default ammunition and no media.
    #[must_use]
    pub fn new(template: ItemTemplateId, name: impl Into<String>, slot_type: SlotType) -> Self {
        Self {
            template,
            name: name.into(),
            slot_type,
            ammo: AmmoInfo::default(),
            animations: ItemAnimations::default(),
            sounds: ItemSounds::default(),
        }
    }
}

/// Registry of blueprints that spawns [`StandardItem`] instances.
#[derive(Clone, Debug, Default)]
pub struct ItemCatalog {
    blueprints: BTreeMap<ItemTemplateId, ItemBlueprint>,
}

impl ItemCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from blueprints; later duplicates replace earlier ones.
    #[must_use]
    pub fn from_blueprints(blueprints: impl IntoIterator<Item = ItemBlueprint>) -> Self {
        let mut catalog = Self::new();
        for blueprint in blueprints {
            let _ = catalog.register(blueprint);
        }
        catalog
    }

    /// Adds a blueprint, returning the one it replaced.
    pub fn register(&mut self, blueprint: ItemBlueprint) -> Option<ItemBlueprint> {
        self.blueprints.insert(blueprint.template, blueprint)
    }

    /// Looks up the blueprint of a template.
    #[must_use]
    pub fn blueprint(&self, template: ItemTemplateId) -> Option<&ItemBlueprint> {
        self.blueprints.get(&template)
    }

    /// Registered templates in ascending identifier order.
    pub fn templates(&self) -> impl Iterator<Item = ItemTemplateId> + '_ {
        self.blueprints.keys().copied()
    }

    /// Number of registered templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blueprints.len()
    }

    /// Whether no templates are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blueprints.is_empty()
    }
}

impl ItemFactory for ItemCatalog {
    fn slot_type(&self, template: ItemTemplateId) -> Option<SlotType> {
        self.blueprint(template).map(|blueprint| blueprint.slot_type)
    }

    fn instantiate(&self, template: ItemTemplateId) -> Option<Box<dyn Item>> {
        self.blueprint(template)
            .map(|blueprint| Box::new(StandardItem::new(blueprint.clone())) as Box<dyn Item>)
    }
}

/// Base item that tracks ammunition and plays the media of its blueprint.
#[derive(Clone, Debug)]
pub struct StandardItem {
    blueprint: ItemBlueprint,
    ammo: AmmoInfo,
    equipped: bool,
}

impl StandardItem {
    /// Creates an unequipped item stocked with the blueprint's ammunition.
    #[must_use]
    pub fn new(blueprint: ItemBlueprint) -> Self {
        Self {
            ammo: blueprint.ammo,
            blueprint,
            equipped: false,
        }
    }

    /// Display name from the blueprint.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.blueprint.name
    }

    fn play(ctx: &mut ItemContext<'_>, sound: Option<&SoundId>) {
        if let Some(sound) = sound {
            ctx.play_sound(sound);
        }
    }
}

impl Item for StandardItem {
    fn template(&self) -> ItemTemplateId {
        self.blueprint.template
    }

    fn is_equipped(&self) -> bool {
        self.equipped
    }

    fn equip_animation(&self) -> Option<&AnimationId> {
        self.blueprint.animations.character_equip.as_ref()
    }

    fn ammo(&self) -> Option<&AmmoInfo> {
        Some(&self.ammo)
    }

    fn on_equip(&mut self, ctx: &mut ItemContext<'_>) {
        if let Some(idle) = &self.blueprint.animations.character_idle {
            ctx.update_idle_animation(idle);
        }
        Self::play(ctx, self.blueprint.sounds.equip.as_ref());
        self.equipped = true;
    }

    fn on_unequip(&mut self, ctx: &mut ItemContext<'_>) {
        if self.equipped {
            Self::play(ctx, self.blueprint.sounds.unequip.as_ref());
        }
        self.equipped = false;
    }

    fn on_fire_pressed(&mut self, ctx: &mut ItemContext<'_>) {
        if !self.ammo.uses_magazines() {
            Self::play(ctx, self.blueprint.sounds.fire.as_ref());
            return;
        }

        if self.ammo.has_rounds() {
            self.ammo.deplete_rounds(1);
            Self::play(ctx, self.blueprint.sounds.fire.as_ref());
        } else {
            Self::play(ctx, self.blueprint.sounds.empty_magazine.as_ref());
        }
    }

    fn on_replenish(&mut self, _ctx: &mut ItemContext<'_>) {
        self.ammo.replenish();
    }

    fn on_request_reload(&mut self, infinite_ammo: bool, ctx: &mut ItemContext<'_>) {
        if !self.ammo.uses_magazines() {
            return;
        }

        match self.ammo.consume_magazine(infinite_ammo) {
            ReloadOutcome::Refilled | ReloadOutcome::RefilledInfinite => {
                Self::play(ctx, self.blueprint.sounds.reload.as_ref());
                if let Some(animation) = &self.blueprint.animations.character_reload {
                    ctx.play_animation(animation, UPPER_BODY_SLOT);
                }
            }
            ReloadOutcome::OutOfMagazines => {
                debug!(item = %self.blueprint.name, "reload requested without spare magazines");
                Self::play(ctx, self.blueprint.sounds.empty_magazine.as_ref());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wave_shooter_core::{Command, EntityId};

    fn rifle() -> ItemBlueprint {
        let mut blueprint = ItemBlueprint::new(ItemTemplateId::new(1), "Rifle", SlotType::Weapon);
        blueprint.ammo = AmmoInfo::with_counts(1, 1, 2, 2, true);
        blueprint.sounds.fire = Some(SoundId::new("rifle_fire"));
        blueprint.sounds.reload = Some(SoundId::new("rifle_reload"));
        blueprint.sounds.empty_magazine = Some(SoundId::new("click"));
        blueprint
    }

    fn sounds(commands: &[Command]) -> Vec<&str> {
        commands
            .iter()
            .filter_map(|command| match command {
                Command::PlaySound { sound } => Some(sound.name()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn firing_depletes_then_clicks() {
        let mut item = StandardItem::new(rifle());
        let mut out = Vec::new();
        let mut ctx = ItemContext::new(EntityId::new(1), &mut out);

        for _ in 0..3 {
            item.on_fire_pressed(&mut ctx);
        }

        assert_eq!(item.ammo().map(AmmoInfo::num_rounds), Some(0));
        assert_eq!(sounds(&out), vec!["rifle_fire", "rifle_fire", "click"]);
    }

    #[test]
    fn reload_without_magazines_clicks() {
        let mut item = StandardItem::new(rifle());
        let mut out = Vec::new();
        let mut ctx = ItemContext::new(EntityId::new(1), &mut out);

        item.on_fire_pressed(&mut ctx);
        item.on_request_reload(false, &mut ctx);
        item.on_fire_pressed(&mut ctx);
        item.on_request_reload(false, &mut ctx);

        let ammo = item.ammo().copied().expect("ammo");
        assert_eq!(ammo.num_magazines(), 0);
        assert_eq!(ammo.num_rounds(), 1);
        assert_eq!(
            sounds(&out),
            vec!["rifle_fire", "rifle_reload", "rifle_fire", "click"]
        );
    }

    #[test]
    fn catalog_instantiates_unequipped_items() {
        let catalog = ItemCatalog::from_blueprints([rifle()]);
        let item = catalog
            .instantiate(ItemTemplateId::new(1))
            .expect("rifle is registered");

        assert!(!item.is_equipped());
        assert_eq!(catalog.slot_type(ItemTemplateId::new(1)), Some(SlotType::Weapon));
        assert!(catalog.instantiate(ItemTemplateId::new(99)).is_none());
        assert_eq!(catalog.slot_type(ItemTemplateId::new(99)), None);
    }
}
