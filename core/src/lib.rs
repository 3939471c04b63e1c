#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the wave shooter gameplay crates.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query the world
//! through narrow traits such as [`EnemyCensus`], and respond exclusively with
//! new command batches.

use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to the arena. Survive the waves.";

/// Number of equipment slots every inventory owns.
pub const SLOT_COUNT: usize = 5;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Registers an enemy template so instances of it may be spawned.
    RegisterEnemyTemplate {
        /// Template that becomes spawnable.
        template: EnemyTemplateId,
    },
    /// Places a spawn point marker into the level.
    PlaceSpawnPoint {
        /// Location and facing of the marker.
        transform: Transform,
    },
    /// Requests that an enemy of the provided template be created.
    SpawnEnemy {
        /// Template describing the enemy to create.
        template: EnemyTemplateId,
        /// Location and facing assigned to the new enemy.
        transform: Transform,
    },
    /// Marks an enemy as dead while leaving its body in the world.
    KillEnemy {
        /// Enemy that died.
        enemy: EntityId,
    },
    /// Removes an enemy from the world regardless of whether it is alive.
    DestroyEnemy {
        /// Enemy targeted for removal.
        enemy: EntityId,
    },
    /// Creates a character that may own an inventory and play animations.
    SpawnCharacter {
        /// Location and facing of the character.
        transform: Transform,
        /// Whether the character carries a skeletal mesh able to play animations.
        skeletal_mesh: bool,
    },
    /// Registers an animation asset so characters may play it.
    RegisterAnimation {
        /// Animation that becomes playable.
        animation: AnimationId,
    },
    /// Requests playback of an animation in a named animation slot.
    PlaySlotAnimation {
        /// Character that should play the animation.
        entity: EntityId,
        /// Animation to play.
        animation: AnimationId,
        /// Name of the animation slot the clip is routed through.
        slot: String,
    },
    /// Replaces the idle pose used by a character.
    UpdateIdleAnimation {
        /// Character whose idle pose changes.
        entity: EntityId,
        /// Animation used as the new idle pose.
        animation: AnimationId,
    },
    /// Requests fire-and-forget playback of a sound.
    PlaySound {
        /// Sound to play.
        sound: SoundId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a spawn point was placed into the level.
    SpawnPointPlaced {
        /// The placed spawn point.
        spawn_point: SpawnPoint,
    },
    /// Confirms that an enemy was created.
    EnemySpawned {
        /// Identifier assigned to the new enemy.
        enemy: EntityId,
        /// Template the enemy was created from.
        template: EnemyTemplateId,
        /// Location and facing of the new enemy.
        transform: Transform,
    },
    /// Reports that an enemy spawn request could not be honoured.
    EnemySpawnRejected {
        /// Template requested by the spawn command.
        template: EnemyTemplateId,
    },
    /// Confirms that an enemy died.
    EnemyKilled {
        /// Enemy that died.
        enemy: EntityId,
    },
    /// Confirms that an enemy was removed from the world.
    EnemyDestroyed {
        /// Enemy that was removed.
        enemy: EntityId,
    },
    /// Confirms that a character was created.
    CharacterSpawned {
        /// Identifier assigned to the character.
        entity: EntityId,
    },
    /// Confirms that an animation began playing.
    AnimationStarted {
        /// Character playing the animation.
        entity: EntityId,
        /// Animation being played.
        animation: AnimationId,
        /// Animation slot the clip is routed through.
        slot: String,
    },
    /// Reports that an animation request was skipped. Never fatal.
    AnimationSkipped {
        /// Character the request targeted.
        entity: EntityId,
        /// Animation that was requested.
        animation: AnimationId,
        /// Specific reason the animation could not play.
        reason: AnimationSkipReason,
    },
    /// Confirms that a character adopted a new idle pose.
    IdleAnimationChanged {
        /// Character whose idle pose changed.
        entity: EntityId,
        /// Animation used as the idle pose.
        animation: AnimationId,
    },
    /// Confirms that a sound was dispatched.
    SoundPlayed {
        /// Sound that was dispatched.
        sound: SoundId,
    },
}

/// Reasons an animation request may be skipped by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationSkipReason {
    /// No character with the requested identifier exists.
    MissingEntity,
    /// The character has no skeletal mesh to animate.
    MissingSkeletalMesh,
    /// The requested animation asset was never registered.
    MissingAnimation,
}

/// Unique identifier assigned to an entity living in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Static definition from which enemy instances are created.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyTemplateId(u32);

impl EnemyTemplateId {
    /// Creates a new enemy template identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the template identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Static definition from which inventory item instances are created.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemTemplateId(u32);

impl ItemTemplateId {
    /// Creates a new item template identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the template identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Name of an animation asset.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnimationId(String);

impl AnimationId {
    /// Creates an animation reference from its asset name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Asset name of the animation.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

/// Name of a sound asset.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SoundId(String);

impl SoundId {
    /// Creates a sound reference from its asset name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Asset name of the sound.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

/// Position and heading of an entity in world space.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform {
    /// World-space position.
    pub translation: Vec3,
    /// Heading around the vertical axis in radians.
    pub yaw: f32,
}

impl Transform {
    /// Creates a transform located at the provided position facing along +X.
    #[must_use]
    pub const fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            yaw: 0.0,
        }
    }
}

/// Marker describing where enemies may enter the level.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    /// Identifier of the marker entity.
    pub id: EntityId,
    /// Location and facing given to enemies spawned here.
    pub transform: Transform,
}

/// Phase of the round scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Waiting between rounds.
    Cooldown,
    /// Enemies are being spawned and fought.
    InRound,
}

/// Read-only snapshot of a single enemy used by census queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Identifier of the enemy entity.
    pub id: EntityId,
    /// Template the enemy was created from.
    pub template: EnemyTemplateId,
    /// Location and facing of the enemy.
    pub transform: Transform,
    /// Whether the enemy is still alive.
    pub alive: bool,
}

/// Enumerates enemy entities by template.
///
/// Implementations may walk every entity in the world, so callers should only
/// query at decision points rather than every frame.
pub trait EnemyCensus {
    /// Returns every enemy, alive or dead, that was created from `template`.
    fn enemies_of(&self, template: EnemyTemplateId) -> Vec<EnemySnapshot>;
}

/// One of the fixed equipment positions an inventory holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Slot {
    /// Main weapon slot.
    PrimaryWeapon,
    /// Backup weapon slot.
    SecondaryWeapon,
    /// Dedicated slot for grenades and other thrown items.
    Throwable,
    /// First gadget slot.
    PrimaryGadget,
    /// Second gadget slot.
    SecondaryGadget,
}

impl Slot {
    /// Every slot in index order.
    pub const ALL: [Slot; SLOT_COUNT] = [
        Slot::PrimaryWeapon,
        Slot::SecondaryWeapon,
        Slot::Throwable,
        Slot::PrimaryGadget,
        Slot::SecondaryGadget,
    ];

    /// Zero-based index of the slot within an inventory.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::PrimaryWeapon => 0,
            Self::SecondaryWeapon => 1,
            Self::Throwable => 2,
            Self::PrimaryGadget => 3,
            Self::SecondaryGadget => 4,
        }
    }

    /// Resolves a slot from its index, returning `None` when out of range.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < SLOT_COUNT {
            Some(Self::ALL[index])
        } else {
            None
        }
    }

    /// Whether the slot holds weapons.
    #[must_use]
    pub const fn is_weapon(self) -> bool {
        matches!(self, Self::PrimaryWeapon | Self::SecondaryWeapon)
    }

    /// Whether the slot holds gadgets.
    #[must_use]
    pub const fn is_gadget(self) -> bool {
        matches!(self, Self::PrimaryGadget | Self::SecondaryGadget)
    }
}

/// Error raised when a numeric slot index does not name a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("slot index {0} is out of range (expected 0..5)")]
pub struct InvalidSlotIndex(pub usize);

impl TryFrom<usize> for Slot {
    type Error = InvalidSlotIndex;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Self::from_index(index).ok_or(InvalidSlotIndex(index))
    }
}

/// Category of slot an item template belongs in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotType {
    /// Goes into one of the two weapon slots.
    Weapon,
    /// Goes into one of the two gadget slots.
    Gadget,
    /// Goes into the throwable slot.
    Throwable,
}

/// Ammunition bookkeeping carried by an item.
///
/// `num_rounds` stays within `0..=max_rounds` and `num_magazines` within
/// `0..=max_magazines` through every mutator. Deserialized counts are clamped
/// the same way [`AmmoInfo::with_counts`] clamps them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "AmmoRecord")]
pub struct AmmoInfo {
    max_magazines: u32,
    num_magazines: u32,
    max_rounds: u32,
    num_rounds: u32,
    uses_magazines: bool,
}

#[derive(Deserialize)]
struct AmmoRecord {
    max_magazines: u32,
    num_magazines: u32,
    max_rounds: u32,
    num_rounds: u32,
    uses_magazines: bool,
}

impl From<AmmoRecord> for AmmoInfo {
    fn from(record: AmmoRecord) -> Self {
        Self::with_counts(
            record.max_magazines,
            record.num_magazines,
            record.max_rounds,
            record.num_rounds,
            record.uses_magazines,
        )
    }
}

impl Default for AmmoInfo {
    fn default() -> Self {
        Self::full(10, 10)
    }
}

impl AmmoInfo {
    /// Creates a fully stocked magazine-fed ammo store.
    #[must_use]
    pub const fn full(max_magazines: u32, max_rounds: u32) -> Self {
        Self {
            max_magazines,
            num_magazines: max_magazines,
            max_rounds,
            num_rounds: max_rounds,
            uses_magazines: true,
        }
    }

    /// Creates an ammo store with explicit counts, clamped to their maxima.
    #[must_use]
    pub fn with_counts(
        max_magazines: u32,
        num_magazines: u32,
        max_rounds: u32,
        num_rounds: u32,
        uses_magazines: bool,
    ) -> Self {
        Self {
            max_magazines,
            num_magazines: num_magazines.min(max_magazines),
            max_rounds,
            num_rounds: num_rounds.min(max_rounds),
            uses_magazines,
        }
    }

    /// Maximum number of spare magazines.
    #[must_use]
    pub const fn max_magazines(&self) -> u32 {
        self.max_magazines
    }

    /// Spare magazines currently held.
    #[must_use]
    pub const fn num_magazines(&self) -> u32 {
        self.num_magazines
    }

    /// Capacity of a single magazine.
    #[must_use]
    pub const fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    /// Rounds left in the loaded magazine.
    #[must_use]
    pub const fn num_rounds(&self) -> u32 {
        self.num_rounds
    }

    /// Whether the item reloads by swapping magazines.
    #[must_use]
    pub const fn uses_magazines(&self) -> bool {
        self.uses_magazines
    }

    /// Whether at least one round is loaded.
    #[must_use]
    pub const fn has_rounds(&self) -> bool {
        self.num_rounds > 0
    }

    /// Removes `count` rounds, saturating at zero.
    pub fn deplete_rounds(&mut self, count: u32) {
        self.num_rounds = self.num_rounds.saturating_sub(count);
    }

    /// Loads a fresh magazine.
    ///
    /// With `infinite` set the rounds are refilled without spending a magazine.
    /// Without spare magazines nothing changes and
    /// [`ReloadOutcome::OutOfMagazines`] is returned.
    pub fn consume_magazine(&mut self, infinite: bool) -> ReloadOutcome {
        if infinite {
            self.num_rounds = self.max_rounds;
            return ReloadOutcome::RefilledInfinite;
        }

        if self.num_magazines == 0 {
            return ReloadOutcome::OutOfMagazines;
        }

        self.num_magazines -= 1;
        self.num_rounds = self.max_rounds;
        ReloadOutcome::Refilled
    }

    /// Restores both magazines and rounds to their maxima.
    pub fn replenish(&mut self) {
        self.num_magazines = self.max_magazines;
        self.num_rounds = self.max_rounds;
    }
}

/// Result of attempting to load a new magazine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReloadOutcome {
    /// A spare magazine was spent and the rounds refilled.
    Refilled,
    /// Rounds were refilled without spending a magazine.
    RefilledInfinite,
    /// No spare magazine remained; nothing changed.
    OutOfMagazines,
}

#[cfg(test)]
mod tests {
    use super::{AmmoInfo, EntityId, ItemTemplateId, ReloadOutcome, Slot, SlotType, SpawnPoint};
    use super::{InvalidSlotIndex, Transform};
    use glam::Vec3;
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn slot_indices_are_stable() {
        for (index, slot) in Slot::ALL.iter().enumerate() {
            assert_eq!(slot.index(), index);
            assert_eq!(Slot::from_index(index), Some(*slot));
        }
        assert_eq!(Slot::from_index(5), None);
        assert_eq!(Slot::try_from(9), Err(InvalidSlotIndex(9)));
    }

    #[test]
    fn slot_categories_match_layout() {
        assert!(Slot::PrimaryWeapon.is_weapon());
        assert!(Slot::SecondaryWeapon.is_weapon());
        assert!(!Slot::Throwable.is_weapon());
        assert!(!Slot::Throwable.is_gadget());
        assert!(Slot::PrimaryGadget.is_gadget());
        assert!(Slot::SecondaryGadget.is_gadget());
    }

    #[test]
    fn depleting_rounds_never_goes_below_zero() {
        let mut ammo = AmmoInfo::full(2, 10);
        ammo.deplete_rounds(3);
        assert_eq!(ammo.num_rounds(), 7);
        ammo.deplete_rounds(u32::MAX);
        assert_eq!(ammo.num_rounds(), 0);
        assert!(!ammo.has_rounds());
    }

    #[test]
    fn infinite_reload_keeps_magazines() {
        let mut ammo = AmmoInfo::with_counts(4, 1, 30, 2, true);
        assert_eq!(ammo.consume_magazine(true), ReloadOutcome::RefilledInfinite);
        assert_eq!(ammo.num_rounds(), 30);
        assert_eq!(ammo.num_magazines(), 1);
    }

    #[test]
    fn reload_spends_a_magazine() {
        let mut ammo = AmmoInfo::with_counts(4, 1, 30, 0, true);
        assert_eq!(ammo.consume_magazine(false), ReloadOutcome::Refilled);
        assert_eq!(ammo.num_rounds(), 30);
        assert_eq!(ammo.num_magazines(), 0);
    }

    #[test]
    fn reload_without_magazines_reports_empty() {
        let mut ammo = AmmoInfo::with_counts(4, 0, 30, 3, true);
        assert_eq!(ammo.consume_magazine(false), ReloadOutcome::OutOfMagazines);
        assert_eq!(ammo.num_rounds(), 3);
        assert_eq!(ammo.num_magazines(), 0);
    }

    #[test]
    fn replenish_restores_maxima() {
        let mut ammo = AmmoInfo::with_counts(6, 0, 12, 0, true);
        ammo.replenish();
        assert_eq!(ammo, AmmoInfo::full(6, 12));
    }

    #[test]
    fn counts_are_clamped_on_construction() {
        let ammo = AmmoInfo::with_counts(2, 9, 5, 40, false);
        assert_eq!(ammo.num_magazines(), 2);
        assert_eq!(ammo.num_rounds(), 5);
    }

    #[test]
    fn deserialized_counts_are_clamped() {
        let bytes = bincode::serialize(&(2u32, 9u32, 10u32, 50u32, true)).expect("serialize");
        let ammo: AmmoInfo = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(ammo, AmmoInfo::with_counts(2, 2, 10, 10, true));
    }

    #[test]
    fn identifiers_round_trip_through_bincode() {
        assert_round_trip(&EntityId::new(42));
        assert_round_trip(&ItemTemplateId::new(7));
        assert_round_trip(&SlotType::Gadget);
        assert_round_trip(&AmmoInfo::default());
    }

    #[test]
    fn spawn_point_round_trips_through_bincode() {
        let spawn_point = SpawnPoint {
            id: EntityId::new(3),
            transform: Transform {
                translation: Vec3::new(1.0, 2.0, 3.0),
                yaw: 0.5,
            },
        };
        assert_round_trip(&spawn_point);
    }
}
