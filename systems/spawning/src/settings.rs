//! File-friendly scheduler settings.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use wave_shooter_core::EnemyTemplateId;

use crate::{Config, HardEnemyChance};

/// Reasons settings cannot be turned into a scheduler configuration.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SettingsError {
    /// The cooldown between rounds must be positive and finite.
    #[error("cooldown_secs must be a positive number of seconds, got {0}")]
    InvalidCooldown(f64),
    /// The delay between spawns must be positive and finite.
    #[error("spawn_delay_secs must be a positive number of seconds, got {0}")]
    InvalidSpawnDelay(f64),
    /// At least one enemy must be allowed alive at a time.
    #[error("max_concurrent_enemies must be greater than zero")]
    ZeroMaxConcurrentEnemies,
    /// Rounds must grow by at least one enemy each.
    #[error("spawn_multiplier must be greater than zero")]
    ZeroSpawnMultiplier,
}

/// Scheduler settings expressed in plain numbers, as loaded from a settings file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpawnSettings {
    /// Seconds of cooldown between rounds.
    pub cooldown_secs: f64,
    /// Seconds between two spawns.
    pub spawn_delay_secs: f64,
    /// Cap on simultaneously alive enemies.
    pub max_concurrent_enemies: u32,
    /// Enemies per round number.
    pub spawn_multiplier: u32,
    /// Seed for the scheduler's random source.
    pub rng_seed: u64,
    /// Template identifiers of basic enemies.
    pub basic_enemies: Vec<u32>,
    /// Template identifiers of hard enemies.
    pub hard_enemies: Vec<u32>,
    /// Policy selecting hard enemies.
    pub hard_enemy_chance: HardEnemyChance,
}

impl Default for SpawnSettings {
    fn default() -> Self {
        Self {
            cooldown_secs: 4.0,
            spawn_delay_secs: 1.0,
            max_concurrent_enemies: 20,
            spawn_multiplier: 5,
            rng_seed: 0,
            basic_enemies: Vec::new(),
            hard_enemies: Vec::new(),
            hard_enemy_chance: HardEnemyChance::NEVER,
        }
    }
}

impl SpawnSettings {
    /// Validates the settings and converts them into a scheduler configuration.
    pub fn into_config(self) -> Result<Config, SettingsError> {
        let cooldown = positive_duration(self.cooldown_secs)
            .ok_or(SettingsError::InvalidCooldown(self.cooldown_secs))?;
        let spawn_delay = positive_duration(self.spawn_delay_secs)
            .ok_or(SettingsError::InvalidSpawnDelay(self.spawn_delay_secs))?;
        if self.max_concurrent_enemies == 0 {
            return Err(SettingsError::ZeroMaxConcurrentEnemies);
        }
        if self.spawn_multiplier == 0 {
            return Err(SettingsError::ZeroSpawnMultiplier);
        }

        let basic = self.basic_enemies.into_iter().map(EnemyTemplateId::new).collect();
        let hard = self.hard_enemies.into_iter().map(EnemyTemplateId::new).collect();

        Ok(Config::new(basic, self.rng_seed)
            .with_cooldown(cooldown)
            .with_spawn_delay(spawn_delay)
            .with_max_concurrent_enemies(self.max_concurrent_enemies)
            .with_spawn_multiplier(self.spawn_multiplier)
            .with_hard_enemies(hard, self.hard_enemy_chance))
    }
}

fn positive_duration(seconds: f64) -> Option<Duration> {
    if seconds.is_finite() && seconds > 0.0 {
        Duration::try_from_secs_f64(seconds).ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_scheduler_defaults() {
        let config = SpawnSettings::default().into_config().expect("valid");
        assert_eq!(config, Config::new(Vec::new(), 0));
    }

    #[test]
    fn rejects_non_positive_timings() {
        let settings = SpawnSettings {
            cooldown_secs: 0.0,
            ..SpawnSettings::default()
        };
        assert_eq!(
            settings.into_config(),
            Err(SettingsError::InvalidCooldown(0.0))
        );

        let settings = SpawnSettings {
            spawn_delay_secs: f64::NAN,
            ..SpawnSettings::default()
        };
        assert!(matches!(
            settings.into_config(),
            Err(SettingsError::InvalidSpawnDelay(_))
        ));
    }

    #[test]
    fn rejects_zero_caps() {
        let settings = SpawnSettings {
            max_concurrent_enemies: 0,
            ..SpawnSettings::default()
        };
        assert_eq!(
            settings.into_config(),
            Err(SettingsError::ZeroMaxConcurrentEnemies)
        );

        let settings = SpawnSettings {
            spawn_multiplier: 0,
            ..SpawnSettings::default()
        };
        assert_eq!(settings.into_config(), Err(SettingsError::ZeroSpawnMultiplier));
    }
}
