#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for the wave shooter.
//!
//! The world owns every entity (spawn points, enemies, characters) and the
//! registries of spawnable templates and playable animations. It only changes
//! through [`apply`], which reports what happened as [`Event`] values.

use std::{collections::BTreeSet, time::Duration};

use wave_shooter_core::{
    AnimationId, AnimationSkipReason, Command, EnemyCensus, EnemySnapshot, EnemyTemplateId,
    EntityId, Event, SpawnPoint, Transform, WELCOME_BANNER,
};

#[derive(Clone, Debug)]
struct Enemy {
    id: EntityId,
    template: EnemyTemplateId,
    transform: Transform,
    alive: bool,
}

impl Enemy {
    fn snapshot(&self) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            template: self.template,
            transform: self.transform,
            alive: self.alive,
        }
    }
}

#[derive(Clone, Debug)]
struct Character {
    id: EntityId,
    transform: Transform,
    skeletal_mesh: bool,
    idle_animation: Option<AnimationId>,
    slot_animation: Option<(AnimationId, String)>,
}

/// Represents the authoritative wave shooter world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    next_entity: u32,
    enemy_templates: BTreeSet<EnemyTemplateId>,
    animations: BTreeSet<AnimationId>,
    spawn_points: Vec<SpawnPoint>,
    enemies: Vec<Enemy>,
    characters: Vec<Character>,
    elapsed: Duration,
    tick_index: u64,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Creates an empty world ready for simulation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            banner: WELCOME_BANNER,
            next_entity: 1,
            enemy_templates: BTreeSet::new(),
            animations: BTreeSet::new(),
            spawn_points: Vec::new(),
            enemies: Vec::new(),
            characters: Vec::new(),
            elapsed: Duration::ZERO,
            tick_index: 0,
        }
    }

    fn allocate_entity(&mut self) -> EntityId {
        let id = EntityId::new(self.next_entity);
        self.next_entity = self.next_entity.saturating_add(1);
        id
    }

    fn enemy_mut(&mut self, enemy: EntityId) -> Option<&mut Enemy> {
        self.enemies.iter_mut().find(|candidate| candidate.id == enemy)
    }

    fn character_mut(&mut self, entity: EntityId) -> Option<&mut Character> {
        self.characters
            .iter_mut()
            .find(|candidate| candidate.id == entity)
    }
}

impl EnemyCensus for World {
    fn enemies_of(&self, template: EnemyTemplateId) -> Vec<EnemySnapshot> {
        self.enemies
            .iter()
            .filter(|enemy| enemy.template == template)
            .map(Enemy::snapshot)
            .collect()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            world.elapsed = world.elapsed.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::RegisterEnemyTemplate { template } => {
            let _ = world.enemy_templates.insert(template);
        }
        Command::PlaceSpawnPoint { transform } => {
            let spawn_point = SpawnPoint {
                id: world.allocate_entity(),
                transform,
            };
            world.spawn_points.push(spawn_point);
            out_events.push(Event::SpawnPointPlaced { spawn_point });
        }
        Command::SpawnEnemy {
            template,
            transform,
        } => {
            if !world.enemy_templates.contains(&template) {
                out_events.push(Event::EnemySpawnRejected { template });
                return;
            }

            let enemy = world.allocate_entity();
            world.enemies.push(Enemy {
                id: enemy,
                template,
                transform,
                alive: true,
            });
            out_events.push(Event::EnemySpawned {
                enemy,
                template,
                transform,
            });
        }
        Command::KillEnemy { enemy } => {
            if let Some(target) = world.enemy_mut(enemy) {
                if target.alive {
                    target.alive = false;
                    out_events.push(Event::EnemyKilled { enemy });
                }
            }
        }
        Command::DestroyEnemy { enemy } => {
            if let Some(index) = world
                .enemies
                .iter()
                .position(|candidate| candidate.id == enemy)
            {
                let _ = world.enemies.remove(index);
                out_events.push(Event::EnemyDestroyed { enemy });
            }
        }
        Command::SpawnCharacter {
            transform,
            skeletal_mesh,
        } => {
            let entity = world.allocate_entity();
            world.characters.push(Character {
                id: entity,
                transform,
                skeletal_mesh,
                idle_animation: None,
                slot_animation: None,
            });
            out_events.push(Event::CharacterSpawned { entity });
        }
        Command::RegisterAnimation { animation } => {
            let _ = world.animations.insert(animation);
        }
        Command::PlaySlotAnimation {
            entity,
            animation,
            slot,
        } => {
            let registered = world.animations.contains(&animation);
            let outcome = match world.character_mut(entity) {
                None => Err(AnimationSkipReason::MissingEntity),
                Some(character) if !character.skeletal_mesh => {
                    Err(AnimationSkipReason::MissingSkeletalMesh)
                }
                Some(_) if !registered => Err(AnimationSkipReason::MissingAnimation),
                Some(character) => {
                    character.slot_animation = Some((animation.clone(), slot.clone()));
                    Ok(())
                }
            };

            match outcome {
                Ok(()) => out_events.push(Event::AnimationStarted {
                    entity,
                    animation,
                    slot,
                }),
                Err(reason) => out_events.push(Event::AnimationSkipped {
                    entity,
                    animation,
                    reason,
                }),
            }
        }
        Command::UpdateIdleAnimation { entity, animation } => {
            if let Some(character) = world.character_mut(entity) {
                if character.skeletal_mesh {
                    character.idle_animation = Some(animation.clone());
                    out_events.push(Event::IdleAnimationChanged { entity, animation });
                }
            }
        }
        Command::PlaySound { sound } => {
            out_events.push(Event::SoundPlayed { sound });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use glam::Vec3;
    use wave_shooter_core::{
        AnimationId, EnemySnapshot, EnemyTemplateId, EntityId, SpawnPoint, Transform,
    };

    use super::{Enemy, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Enumerates every spawn point placed into the level.
    #[must_use]
    pub fn spawn_points(world: &World) -> Vec<SpawnPoint> {
        world.spawn_points.clone()
    }

    /// Reports whether instances of the template may be spawned.
    #[must_use]
    pub fn is_enemy_template_registered(world: &World, template: EnemyTemplateId) -> bool {
        world.enemy_templates.contains(&template)
    }

    /// Captures every enemy in the world ordered by identifier.
    #[must_use]
    pub fn enemies(world: &World) -> Vec<EnemySnapshot> {
        let mut snapshots: Vec<EnemySnapshot> =
            world.enemies.iter().map(Enemy::snapshot).collect();
        snapshots.sort_by_key(|snapshot| snapshot.id);
        snapshots
    }

    /// Looks up a single enemy.
    #[must_use]
    pub fn enemy(world: &World, enemy: EntityId) -> Option<EnemySnapshot> {
        world
            .enemies
            .iter()
            .find(|candidate| candidate.id == enemy)
            .map(Enemy::snapshot)
    }

    /// Finds the live enemy closest to `position` without reordering anything.
    ///
    /// Ties resolve to the enemy spawned first.
    #[must_use]
    pub fn closest_enemy(world: &World, position: Vec3) -> Option<EnemySnapshot> {
        let mut closest: Option<(&Enemy, f32)> = None;
        for enemy in world.enemies.iter().filter(|enemy| enemy.alive) {
            let distance = enemy.transform.translation.distance_squared(position);
            match closest {
                Some((_, best)) if distance >= best => {}
                _ => closest = Some((enemy, distance)),
            }
        }
        closest.map(|(enemy, _)| enemy.snapshot())
    }

    /// Location of the character, if it exists.
    #[must_use]
    pub fn character_transform(world: &World, entity: EntityId) -> Option<Transform> {
        world
            .characters
            .iter()
            .find(|character| character.id == entity)
            .map(|character| character.transform)
    }

    /// Idle pose currently applied to the character.
    #[must_use]
    pub fn idle_animation(world: &World, entity: EntityId) -> Option<&AnimationId> {
        world
            .characters
            .iter()
            .find(|character| character.id == entity)
            .and_then(|character| character.idle_animation.as_ref())
    }

    /// Animation most recently started on the character and its slot name.
    #[must_use]
    pub fn slot_animation(world: &World, entity: EntityId) -> Option<(&AnimationId, &str)> {
        world
            .characters
            .iter()
            .find(|character| character.id == entity)
            .and_then(|character| character.slot_animation.as_ref())
            .map(|(animation, slot)| (animation, slot.as_str()))
    }

    /// Total simulated time that has elapsed.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }

    /// Number of ticks processed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use wave_shooter_core::SoundId;

    fn at(x: f32, y: f32) -> Transform {
        Transform::from_translation(Vec3::new(x, y, 0.0))
    }

    fn spawn(world: &mut World, template: EnemyTemplateId, transform: Transform) -> EntityId {
        let mut events = Vec::new();
        apply(
            world,
            Command::SpawnEnemy {
                template,
                transform,
            },
            &mut events,
        );
        match events.as_slice() {
            [Event::EnemySpawned { enemy, .. }] => *enemy,
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[test]
    fn unregistered_templates_are_rejected() {
        let mut world = World::new();
        let mut events = Vec::new();
        let template = EnemyTemplateId::new(9);

        apply(
            &mut world,
            Command::SpawnEnemy {
                template,
                transform: at(0.0, 0.0),
            },
            &mut events,
        );

        assert_eq!(events, vec![Event::EnemySpawnRejected { template }]);
        assert!(query::enemies(&world).is_empty());
    }

    #[test]
    fn census_lists_dead_and_alive_enemies_by_template() {
        let mut world = World::new();
        let mut events = Vec::new();
        let grunt = EnemyTemplateId::new(1);
        let brute = EnemyTemplateId::new(2);
        for template in [grunt, brute] {
            apply(
                &mut world,
                Command::RegisterEnemyTemplate { template },
                &mut events,
            );
        }

        let first = spawn(&mut world, grunt, at(0.0, 0.0));
        let _second = spawn(&mut world, grunt, at(1.0, 0.0));
        let _third = spawn(&mut world, brute, at(2.0, 0.0));
        apply(&mut world, Command::KillEnemy { enemy: first }, &mut events);

        let grunts = world.enemies_of(grunt);
        assert_eq!(grunts.len(), 2);
        assert_eq!(grunts.iter().filter(|enemy| enemy.alive).count(), 1);
        assert_eq!(world.enemies_of(brute).len(), 1);
    }

    #[test]
    fn destroying_removes_enemy() {
        let mut world = World::new();
        let mut events = Vec::new();
        let grunt = EnemyTemplateId::new(1);
        apply(
            &mut world,
            Command::RegisterEnemyTemplate { template: grunt },
            &mut events,
        );
        let enemy = spawn(&mut world, grunt, at(0.0, 0.0));

        events.clear();
        apply(&mut world, Command::DestroyEnemy { enemy }, &mut events);
        apply(&mut world, Command::DestroyEnemy { enemy }, &mut events);

        assert_eq!(events, vec![Event::EnemyDestroyed { enemy }]);
        assert!(query::enemy(&world, enemy).is_none());
    }

    #[test]
    fn closest_enemy_ignores_the_dead() {
        let mut world = World::new();
        let mut events = Vec::new();
        let grunt = EnemyTemplateId::new(1);
        apply(
            &mut world,
            Command::RegisterEnemyTemplate { template: grunt },
            &mut events,
        );
        let near = spawn(&mut world, grunt, at(1.0, 0.0));
        let far = spawn(&mut world, grunt, at(5.0, 0.0));

        let found = query::closest_enemy(&world, Vec3::ZERO).expect("enemy");
        assert_eq!(found.id, near);

        apply(&mut world, Command::KillEnemy { enemy: near }, &mut events);
        let found = query::closest_enemy(&world, Vec3::ZERO).expect("enemy");
        assert_eq!(found.id, far);
    }

    #[test]
    fn animation_requires_mesh_and_registered_clip() {
        let mut world = World::new();
        let mut events = Vec::new();
        let clip = AnimationId::new("equip_rifle");

        apply(
            &mut world,
            Command::SpawnCharacter {
                transform: at(0.0, 0.0),
                skeletal_mesh: true,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::SpawnCharacter {
                transform: at(0.0, 0.0),
                skeletal_mesh: false,
            },
            &mut events,
        );
        let (animated, static_mesh) = match events.as_slice() {
            [Event::CharacterSpawned { entity: a }, Event::CharacterSpawned { entity: b }] => {
                (*a, *b)
            }
            other => panic!("unexpected events: {other:?}"),
        };

        events.clear();
        let play = |entity| Command::PlaySlotAnimation {
            entity,
            animation: clip.clone(),
            slot: "UpperBodySlot".to_owned(),
        };
        apply(&mut world, play(animated), &mut events);
        apply(
            &mut world,
            Command::RegisterAnimation {
                animation: clip.clone(),
            },
            &mut events,
        );
        apply(&mut world, play(static_mesh), &mut events);
        apply(&mut world, play(animated), &mut events);

        assert_eq!(
            events,
            vec![
                Event::AnimationSkipped {
                    entity: animated,
                    animation: clip.clone(),
                    reason: AnimationSkipReason::MissingAnimation,
                },
                Event::AnimationSkipped {
                    entity: static_mesh,
                    animation: clip.clone(),
                    reason: AnimationSkipReason::MissingSkeletalMesh,
                },
                Event::AnimationStarted {
                    entity: animated,
                    animation: clip.clone(),
                    slot: "UpperBodySlot".to_owned(),
                },
            ],
        );
        assert_eq!(
            query::slot_animation(&world, animated),
            Some((&clip, "UpperBodySlot"))
        );
    }

    #[test]
    fn ticks_accumulate_elapsed_time_and_sounds_echo() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(250),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::PlaySound {
                sound: SoundId::new("click"),
            },
            &mut events,
        );

        assert_eq!(query::elapsed(&world), Duration::from_millis(250));
        assert_eq!(query::tick_index(&world), 1);
        assert_eq!(
            events,
            vec![
                Event::TimeAdvanced {
                    dt: Duration::from_millis(250)
                },
                Event::SoundPlayed {
                    sound: SoundId::new("click")
                },
            ],
        );
    }
}
