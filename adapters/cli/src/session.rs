//! Scripted headless match wiring the world, the round scheduler and a player inventory.

use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use glam::Vec3;
use serde::Deserialize;
use tracing::{debug, info};
use wave_shooter_core::{
    AmmoInfo, AnimationId, Command, EnemyTemplateId, EntityId, Event, ItemTemplateId, RoundPhase,
    Slot, SlotType, SoundId, Transform,
};
use wave_shooter_system_bootstrap::Bootstrap;
use wave_shooter_system_inventory::{
    Inventory, ItemBlueprint, ItemCatalog, ItemFactory, UPPER_BODY_SLOT,
};
use wave_shooter_system_spawning::{HardEnemyChance, RoundScheduler, SpawnSettings};
use wave_shooter_world::{self as world, query, World};

const SPAWN_RING_RADIUS: f32 = 30.0;
const SPAWN_POINT_COUNT: u32 = 6;
const FIRE_INTERVAL: Duration = Duration::from_millis(300);
const GRENADE_CROWD: usize = 4;
const BLAST_RADIUS: f32 = 6.0;

/// Contents of a match settings file.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct MatchSettings {
    spawning: SpawnSettings,
    items: Vec<ItemBlueprint>,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            spawning: SpawnSettings {
                basic_enemies: vec![1, 2],
                hard_enemies: vec![10],
                hard_enemy_chance: HardEnemyChance::scaling(0.05, 0.5),
                ..SpawnSettings::default()
            },
            items: default_items(),
        }
    }
}

impl MatchSettings {
    /// Reads settings from a TOML file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("failed to parse settings in {}", path.display()))
    }
}

fn default_items() -> Vec<ItemBlueprint> {
    let mut rifle = ItemBlueprint::new(ItemTemplateId::new(1), "Rifle", SlotType::Weapon);
    rifle.ammo = AmmoInfo::full(4, 30);
    rifle.animations.character_equip = Some(AnimationId::new("rifle_equip"));
    rifle.animations.character_idle = Some(AnimationId::new("rifle_idle"));
    rifle.animations.character_reload = Some(AnimationId::new("rifle_reload"));
    rifle.sounds.fire = Some(SoundId::new("rifle_fire"));
    rifle.sounds.reload = Some(SoundId::new("rifle_reload"));
    rifle.sounds.empty_magazine = Some(SoundId::new("dry_fire"));

    let mut pistol = ItemBlueprint::new(ItemTemplateId::new(2), "Pistol", SlotType::Weapon);
    pistol.ammo = AmmoInfo::full(6, 12);
    pistol.animations.character_equip = Some(AnimationId::new("pistol_equip"));
    pistol.animations.character_idle = Some(AnimationId::new("pistol_idle"));
    pistol.sounds.fire = Some(SoundId::new("pistol_fire"));
    pistol.sounds.empty_magazine = Some(SoundId::new("dry_fire"));

    let mut grenade = ItemBlueprint::new(ItemTemplateId::new(20), "Grenade", SlotType::Throwable);
    grenade.ammo = AmmoInfo::full(0, 2);
    grenade.sounds.fire = Some(SoundId::new("grenade_blast"));

    vec![rifle, pistol, grenade]
}

/// Running totals reported at the end of a match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct MatchStats {
    /// Highest round the scheduler entered.
    pub(crate) rounds_reached: u32,
    /// Enemies the world accepted.
    pub(crate) enemies_spawned: u64,
    /// Enemies killed by the player.
    pub(crate) enemies_killed: u64,
    /// Shots that left a weapon.
    pub(crate) shots_fired: u64,
    /// Reload requests sent to the equipped weapon.
    pub(crate) reloads: u64,
    /// Grenades that were thrown.
    pub(crate) grenades_thrown: u64,
    /// Sounds dispatched by items.
    pub(crate) sounds_played: u64,
}

/// A single match driven tick by tick.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    scheduler: RoundScheduler,
    catalog: ItemCatalog,
    inventory: Inventory,
    player: EntityId,
    fire_cooldown: Duration,
    stats: MatchStats,
}

impl Session {
    /// Builds the level, greets the player and hands out the starting loadout.
    pub(crate) fn new(settings: MatchSettings, seed: Option<u64>) -> Result<Self> {
        let MatchSettings {
            mut spawning,
            items,
        } = settings;
        if let Some(seed) = seed {
            spawning.rng_seed = seed;
        }

        let mut world = World::new();
        let mut setup = Vec::new();
        for template in spawning
            .basic_enemies
            .iter()
            .chain(&spawning.hard_enemies)
        {
            setup.push(Command::RegisterEnemyTemplate {
                template: EnemyTemplateId::new(*template),
            });
        }
        for index in 0..SPAWN_POINT_COUNT {
            let angle = std::f32::consts::TAU * index as f32 / SPAWN_POINT_COUNT as f32;
            setup.push(Command::PlaceSpawnPoint {
                transform: Transform {
                    translation: Vec3::new(angle.cos(), 0.0, angle.sin()) * SPAWN_RING_RADIUS,
                    yaw: angle + std::f32::consts::PI,
                },
            });
        }
        for blueprint in &items {
            let animations = &blueprint.animations;
            for animation in [
                &animations.character_equip,
                &animations.character_idle,
                &animations.character_reload,
            ]
            .into_iter()
            .flatten()
            {
                setup.push(Command::RegisterAnimation {
                    animation: animation.clone(),
                });
            }
        }
        setup.push(Command::SpawnCharacter {
            transform: Transform::default(),
            skeletal_mesh: true,
        });

        let events = apply_all(&mut world, setup);
        let Some(player) = events.iter().find_map(|event| match event {
            Event::CharacterSpawned { entity } => Some(*entity),
            _ => None,
        }) else {
            bail!("world did not spawn the player character");
        };

        let config = spawning
            .into_config()
            .context("invalid spawning settings")?;
        let bootstrap = Bootstrap;
        info!(banner = bootstrap.welcome_banner(&world), "level ready");
        let mut scheduler = RoundScheduler::new(config);
        scheduler.discover_spawn_points(bootstrap.discover_spawn_points(&world));

        let catalog = ItemCatalog::from_blueprints(items);
        let mut inventory = Inventory::new(player);
        let mut out = Vec::new();
        let mut equipped = false;
        let templates: Vec<_> = catalog.templates().collect();
        for template in templates {
            let equip = !equipped && catalog.slot_type(template) == Some(SlotType::Weapon);
            let _ = inventory
                .swap_item(template, equip, &catalog, &mut out)
                .with_context(|| format!("failed to hand out item {}", template.get()))?;
            equipped |= equip;
        }

        let mut session = Self {
            world,
            scheduler,
            catalog,
            inventory,
            player,
            fire_cooldown: Duration::ZERO,
            stats: MatchStats::default(),
        };
        session.dispatch(out);
        Ok(session)
    }

    /// Banner greeting the player.
    pub(crate) fn banner(&self) -> &str {
        Bootstrap.welcome_banner(&self.world)
    }

    /// Advances the match by `dt` of simulated time.
    pub(crate) fn step(&mut self, dt: Duration) {
        let phase_before = self.scheduler.phase();

        let mut events = Vec::new();
        world::apply(&mut self.world, Command::Tick { dt }, &mut events);
        let mut commands = Vec::new();
        self.scheduler.handle(&events, &self.world, &mut commands);
        for event in apply_all(&mut self.world, commands) {
            if matches!(event, Event::EnemySpawned { .. }) {
                self.stats.enemies_spawned += 1;
            }
        }
        self.stats.rounds_reached = self.stats.rounds_reached.max(self.scheduler.current_round());

        let mut out = Vec::new();
        if phase_before == RoundPhase::InRound && self.scheduler.phase() == RoundPhase::Cooldown {
            debug!(round = self.scheduler.current_round(), "round cleared, restocking");
            self.inventory.replenish_all_ammo(&mut out);
            let _ = self
                .inventory
                .equip_item(Slot::PrimaryWeapon, UPPER_BODY_SLOT, &mut out);
        }

        self.fire_cooldown = self.fire_cooldown.saturating_sub(dt);
        if self.fire_cooldown.is_zero() {
            self.fire_cooldown = FIRE_INTERVAL;
            self.player_turn(&mut out);
        }
        self.dispatch(out);
    }

    /// Puts the player's items away and returns the totals.
    pub(crate) fn finish(mut self) -> MatchStats {
        let mut out = Vec::new();
        self.inventory.destroy_items(&mut out);
        self.dispatch(out);
        info!(items = self.catalog.len(), "match finished");
        self.stats
    }

    fn player_turn(&mut self, out: &mut Vec<Command>) {
        let Some(position) = query::character_transform(&self.world, self.player)
            .map(|transform| transform.translation)
        else {
            return;
        };
        let Some(target) = query::closest_enemy(&self.world, position) else {
            return;
        };

        let crowd: Vec<_> = query::enemies(&self.world)
            .into_iter()
            .filter(|enemy| {
                enemy.alive
                    && enemy
                        .transform
                        .translation
                        .distance(target.transform.translation)
                        <= BLAST_RADIUS
            })
            .collect();
        if crowd.len() >= GRENADE_CROWD {
            let before = rounds_in(self.inventory.item(Slot::Throwable).and_then(|item| item.ammo()));
            self.inventory.on_throw_pressed(out);
            self.inventory.on_throw_released(out);
            let after = rounds_in(self.inventory.item(Slot::Throwable).and_then(|item| item.ammo()));
            if after < before {
                self.stats.grenades_thrown += 1;
                for enemy in crowd {
                    self.kill(enemy.id, out);
                }
                return;
            }
        }

        let before = self.selected_ammo();
        self.inventory.on_fire_pressed(out);
        self.inventory.on_fire_released(out);
        let after = self.selected_ammo();

        let fired = match before {
            Some(ammo) if ammo.uses_magazines() => rounds_in(after.as_ref()) < ammo.num_rounds(),
            _ => true,
        };
        if fired {
            self.stats.shots_fired += 1;
            self.kill(target.id, out);
            return;
        }

        self.stats.reloads += 1;
        self.inventory.reload_selected(out);
        if rounds_in(self.selected_ammo().as_ref()) == 0 {
            let fallback = match self.inventory.equipped_slot() {
                Slot::PrimaryWeapon => Slot::SecondaryWeapon,
                _ => Slot::PrimaryWeapon,
            };
            if self.inventory.equip_item(fallback, UPPER_BODY_SLOT, out) {
                debug!(?fallback, "switched weapons after running dry");
            }
        }
    }

    fn selected_ammo(&self) -> Option<AmmoInfo> {
        self.inventory
            .selected_item()
            .and_then(|item| item.ammo())
            .copied()
    }

    fn kill(&mut self, enemy: EntityId, out: &mut Vec<Command>) {
        self.stats.enemies_killed += 1;
        out.push(Command::KillEnemy { enemy });
    }

    fn dispatch(&mut self, commands: Vec<Command>) {
        for event in apply_all(&mut self.world, commands) {
            match event {
                Event::SoundPlayed { .. } => self.stats.sounds_played += 1,
                Event::AnimationSkipped {
                    entity,
                    animation,
                    reason,
                } => debug!(
                    entity = entity.get(),
                    animation = animation.name(),
                    ?reason,
                    "animation skipped"
                ),
                _ => {}
            }
        }
    }
}

fn rounds_in(ammo: Option<&AmmoInfo>) -> u32 {
    ammo.map_or(0, AmmoInfo::num_rounds)
}

fn apply_all(world: &mut World, commands: Vec<Command>) -> Vec<Event> {
    let mut events = Vec::new();
    for command in commands {
        world::apply(world, command, &mut events);
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(seed: u64, seconds: u64) -> MatchStats {
        let mut session = Session::new(MatchSettings::default(), Some(seed)).expect("session");
        for _ in 0..seconds * 10 {
            session.step(Duration::from_millis(100));
        }
        session.finish()
    }

    #[test]
    fn default_match_progresses_through_rounds() {
        let stats = play(3, 120);

        assert!(stats.rounds_reached >= 2, "stats: {stats:?}");
        assert!(stats.enemies_spawned > 0);
        assert!(stats.enemies_killed > 0);
        assert!(stats.shots_fired > 0);
        assert!(stats.sounds_played >= stats.shots_fired);
    }

    #[test]
    fn matches_replay_deterministically() {
        assert_eq!(play(11, 60), play(11, 60));
    }

    #[test]
    fn settings_file_overrides_spawning_and_items() {
        let settings: MatchSettings = toml::from_str(
            r#"
            [spawning]
            cooldown_secs = 1.0
            spawn_multiplier = 2
            basic_enemies = [5]

            [[items]]
            template = 7
            name = "Carbine"
            slot_type = "Weapon"
            "#,
        )
        .expect("settings parse");

        let session = Session::new(settings, None).expect("session");
        assert_eq!(
            session.inventory.selected_item().map(|item| item.template()),
            Some(ItemTemplateId::new(7))
        );
        assert_eq!(session.catalog.len(), 1);
    }

    #[test]
    fn invalid_spawning_settings_are_reported() {
        let settings: MatchSettings =
            toml::from_str("[spawning]\nmax_concurrent_enemies = 0\n").expect("settings parse");

        let error = Session::new(settings, None).expect_err("zero cap is invalid");
        assert!(format!("{error:#}").contains("max_concurrent_enemies"));
    }
}
