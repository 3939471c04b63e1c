#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Round scheduler responsible for emitting enemy spawn and cleanup commands.
//!
//! The scheduler alternates between a cooldown and an in-round phase. While a
//! round is running it issues at most one spawn per `spawn_delay` of simulated
//! time, never letting the number of live enemies exceed the configured cap,
//! until `round × spawn_multiplier` enemies have been issued. Once every
//! issued enemy is dead the cooldown begins; when it expires the round counter
//! advances, leftover bodies are destroyed and the next round starts.

pub mod settings;

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use wave_shooter_core::{Command, EnemyCensus, EnemyTemplateId, Event, RoundPhase, SpawnPoint};

pub use settings::{SettingsError, SpawnSettings};

const DEFAULT_COOLDOWN: Duration = Duration::from_secs(4);
const DEFAULT_SPAWN_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_MAX_CONCURRENT_ENEMIES: u32 = 20;
const DEFAULT_SPAWN_MULTIPLIER: u32 = 5;

/// Reasons a single spawn attempt could not be issued.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SpawnError {
    /// The level has no discovered spawn points.
    #[error("no spawn points were discovered in the level")]
    NoSpawnPoints,
    /// No basic enemy template is registered with the scheduler.
    #[error("no basic enemy templates are registered")]
    NoBasicEnemyTemplates,
    /// No hard enemy template is registered with the scheduler.
    #[error("no hard enemy templates are registered")]
    NoHardEnemyTemplates,
}

/// Probability curve deciding whether a spawn uses a hard enemy template.
///
/// The chance grows by `per_round` every round and never exceeds `max`.
#[derive(Clone, Copy, Debug, PartialEq, Default, Deserialize)]
pub struct HardEnemyChance {
    /// Probability added per round number.
    pub per_round: f32,
    /// Upper bound of the probability.
    pub max: f32,
}

impl HardEnemyChance {
    /// Policy that only ever spawns basic enemies.
    pub const NEVER: Self = Self {
        per_round: 0.0,
        max: 0.0,
    };

    /// Creates a policy scaling linearly with the round number.
    #[must_use]
    pub const fn scaling(per_round: f32, max: f32) -> Self {
        Self { per_round, max }
    }

    /// Probability in `[0, 1]` of spawning a hard enemy during `round`.
    #[must_use]
    pub fn probability(&self, round: u32) -> f64 {
        let scaled = f64::from(self.per_round) * f64::from(round);
        let capped = scaled.min(f64::from(self.max));
        if capped.is_nan() {
            return 0.0;
        }
        capped.clamp(0.0, 1.0)
    }
}

/// Configuration parameters required to construct the round scheduler.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    cooldown: Duration,
    spawn_delay: Duration,
    max_concurrent_enemies: u32,
    spawn_multiplier: u32,
    basic_enemies: Vec<EnemyTemplateId>,
    hard_enemies: Vec<EnemyTemplateId>,
    hard_enemy_chance: HardEnemyChance,
    rng_seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Vec::new(), 0)
    }
}

impl Config {
    /// Creates a configuration with default pacing for the provided basic enemies and seed.
    #[must_use]
    pub fn new(basic_enemies: Vec<EnemyTemplateId>, rng_seed: u64) -> Self {
        Self {
            cooldown: DEFAULT_COOLDOWN,
            spawn_delay: DEFAULT_SPAWN_DELAY,
            max_concurrent_enemies: DEFAULT_MAX_CONCURRENT_ENEMIES,
            spawn_multiplier: DEFAULT_SPAWN_MULTIPLIER,
            basic_enemies,
            hard_enemies: Vec::new(),
            hard_enemy_chance: HardEnemyChance::NEVER,
            rng_seed,
        }
    }

    /// Overrides the time spent between rounds.
    #[must_use]
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Overrides the minimum time between two spawns.
    #[must_use]
    pub fn with_spawn_delay(mut self, spawn_delay: Duration) -> Self {
        self.spawn_delay = spawn_delay;
        self
    }

    /// Overrides the cap on simultaneously alive enemies.
    #[must_use]
    pub fn with_max_concurrent_enemies(mut self, max_concurrent_enemies: u32) -> Self {
        self.max_concurrent_enemies = max_concurrent_enemies;
        self
    }

    /// Overrides the per-round enemy multiplier.
    #[must_use]
    pub fn with_spawn_multiplier(mut self, spawn_multiplier: u32) -> Self {
        self.spawn_multiplier = spawn_multiplier;
        self
    }

    /// Registers hard enemy templates together with the policy that selects them.
    #[must_use]
    pub fn with_hard_enemies(
        mut self,
        hard_enemies: Vec<EnemyTemplateId>,
        chance: HardEnemyChance,
    ) -> Self {
        self.hard_enemies = hard_enemies;
        self.hard_enemy_chance = chance;
        self
    }

    /// Seed used when the scheduler owns its random number generator.
    #[must_use]
    pub const fn rng_seed(&self) -> u64 {
        self.rng_seed
    }
}

/// Pure system that schedules rounds and emits spawn commands.
#[derive(Debug)]
pub struct RoundScheduler<R = ChaCha8Rng> {
    round: u32,
    phase: RoundPhase,
    cooldown: Duration,
    cooldown_remaining: Duration,
    spawn_delay: Duration,
    accumulator: Duration,
    max_concurrent_enemies: u32,
    spawn_multiplier: u32,
    enemies_target: u32,
    spawned_this_round: u32,
    spawn_points: Vec<SpawnPoint>,
    basic_enemies: Vec<EnemyTemplateId>,
    hard_enemies: Vec<EnemyTemplateId>,
    hard_enemy_chance: HardEnemyChance,
    stalled_spawns: u64,
    rng: R,
}

impl RoundScheduler<ChaCha8Rng> {
    /// Creates a scheduler whose random source is seeded from the configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.rng_seed);
        Self::with_rng(config, rng)
    }
}

impl<R: Rng> RoundScheduler<R> {
    /// Creates a scheduler drawing random numbers from the injected source.
    ///
    /// The scheduler starts in the cooldown phase of round zero.
    #[must_use]
    pub fn with_rng(config: Config, rng: R) -> Self {
        Self {
            round: 0,
            phase: RoundPhase::Cooldown,
            cooldown: config.cooldown,
            cooldown_remaining: config.cooldown,
            spawn_delay: config.spawn_delay,
            accumulator: Duration::ZERO,
            max_concurrent_enemies: config.max_concurrent_enemies,
            spawn_multiplier: config.spawn_multiplier,
            enemies_target: 0,
            spawned_this_round: 0,
            spawn_points: Vec::new(),
            basic_enemies: config.basic_enemies,
            hard_enemies: config.hard_enemies,
            hard_enemy_chance: config.hard_enemy_chance,
            stalled_spawns: 0,
            rng,
        }
    }

    /// Replaces the known spawn points. Called once when the level starts.
    pub fn discover_spawn_points(&mut self, spawn_points: Vec<SpawnPoint>) {
        if spawn_points.is_empty() {
            warn!("spawn point discovery found no spawn points; spawning will stall");
        } else {
            debug!(count = spawn_points.len(), "discovered spawn points");
        }
        self.spawn_points = spawn_points;
    }

    /// Consumes world events and emits spawn and cleanup commands.
    ///
    /// The census is consulted at most once per call, and only when a spawn
    /// cadence boundary was crossed or the cooldown expired. The round-end
    /// check rides the same cadence, so the cooldown begins at the first
    /// boundary after the last enemy dies, up to `spawn_delay` later when
    /// ticks are shorter than the delay.
    pub fn handle<C>(&mut self, events: &[Event], census: &C, out: &mut Vec<Command>)
    where
        C: EnemyCensus + ?Sized,
    {
        let mut elapsed = Duration::ZERO;
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                elapsed = elapsed.saturating_add(*dt);
            }
        }

        if elapsed.is_zero() {
            return;
        }

        match self.phase {
            RoundPhase::Cooldown => self.advance_cooldown(elapsed, census, out),
            RoundPhase::InRound => self.advance_round(elapsed, census, out),
        }
    }

    /// Enters the in-round phase using the current round number.
    ///
    /// The target is `round × spawn_multiplier`, so round zero spawns nothing.
    pub fn start_round(&mut self) {
        self.phase = RoundPhase::InRound;
        self.spawned_this_round = 0;
        self.accumulator = Duration::ZERO;
        self.enemies_target = self.round.saturating_mul(self.spawn_multiplier);
        info!(
            round = self.round,
            target = self.enemies_target,
            "round started"
        );
    }

    /// Advances the round counter by one.
    pub fn increment_round(&mut self) {
        self.round = self.round.saturating_add(1);
    }

    /// Emits destroy commands for every enemy of every registered template, dead or alive.
    pub fn cleanup_enemies<C>(&self, census: &C, out: &mut Vec<Command>)
    where
        C: EnemyCensus + ?Sized,
    {
        for template in self.registered_templates() {
            for enemy in census.enemies_of(template) {
                out.push(Command::DestroyEnemy { enemy: enemy.id });
            }
        }
    }

    /// Counts enemies of the registered templates that are still alive.
    ///
    /// Walks every enemy in the census; avoid calling it every frame.
    pub fn count_live_enemies<C>(&self, census: &C) -> u32
    where
        C: EnemyCensus + ?Sized,
    {
        let mut live = 0u32;
        for template in self.registered_templates() {
            let alive = census
                .enemies_of(template)
                .iter()
                .filter(|enemy| enemy.alive)
                .count();
            live = live.saturating_add(u32::try_from(alive).unwrap_or(u32::MAX));
        }
        live
    }

    /// Selects one of the discovered spawn points uniformly at random.
    pub fn pick_spawn_point(&mut self) -> Result<SpawnPoint, SpawnError> {
        if self.spawn_points.is_empty() {
            return Err(SpawnError::NoSpawnPoints);
        }
        let index = self.rng.gen_range(0..self.spawn_points.len());
        Ok(self.spawn_points[index])
    }

    /// Selects a basic or hard enemy template uniformly at random.
    pub fn pick_enemy_class(&mut self, hard: bool) -> Result<EnemyTemplateId, SpawnError> {
        let (templates, missing) = if hard {
            (&self.hard_enemies, SpawnError::NoHardEnemyTemplates)
        } else {
            (&self.basic_enemies, SpawnError::NoBasicEnemyTemplates)
        };

        if templates.is_empty() {
            return Err(missing);
        }
        let index = self.rng.gen_range(0..templates.len());
        Ok(templates[index])
    }

    /// Issues a single spawn command and counts it against the current round.
    pub fn spawn_enemy(&mut self, hard: bool, out: &mut Vec<Command>) -> Result<(), SpawnError> {
        let spawn_point = self.pick_spawn_point()?;
        let template = self.pick_enemy_class(hard)?;
        out.push(Command::SpawnEnemy {
            template,
            transform: spawn_point.transform,
        });
        self.spawned_this_round = self.spawned_this_round.saturating_add(1);
        Ok(())
    }

    /// Round currently being played or waited for.
    #[must_use]
    pub const fn current_round(&self) -> u32 {
        self.round
    }

    /// Current scheduling phase.
    #[must_use]
    pub const fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Number of enemies the current round spawns in total.
    #[must_use]
    pub const fn enemies_target(&self) -> u32 {
        self.enemies_target
    }

    /// Number of spawns issued since the round started.
    #[must_use]
    pub const fn spawned_this_round(&self) -> u32 {
        self.spawned_this_round
    }

    /// Time left before the next round starts.
    #[must_use]
    pub const fn cooldown_remaining(&self) -> Duration {
        self.cooldown_remaining
    }

    /// Spawn points known to the scheduler.
    #[must_use]
    pub fn spawn_points(&self) -> &[SpawnPoint] {
        &self.spawn_points
    }

    /// Number of spawn attempts abandoned because of missing content.
    #[must_use]
    pub const fn stalled_spawns(&self) -> u64 {
        self.stalled_spawns
    }

    fn advance_cooldown<C>(&mut self, elapsed: Duration, census: &C, out: &mut Vec<Command>)
    where
        C: EnemyCensus + ?Sized,
    {
        self.cooldown_remaining = self.cooldown_remaining.saturating_sub(elapsed);
        if !self.cooldown_remaining.is_zero() {
            return;
        }

        self.increment_round();
        self.cleanup_enemies(census, out);
        self.start_round();
    }

    fn advance_round<C>(&mut self, elapsed: Duration, census: &C, out: &mut Vec<Command>)
    where
        C: EnemyCensus + ?Sized,
    {
        self.accumulator = self.accumulator.saturating_add(elapsed);
        let owed = self.enemies_target.saturating_sub(self.spawned_this_round);
        let decision_points = self.resolve_decision_points(owed.max(1));
        if decision_points == 0 {
            return;
        }

        let live = self.count_live_enemies(census);
        let mut issued = 0u32;
        for _ in 0..decision_points {
            if self.spawned_this_round >= self.enemies_target {
                break;
            }
            if live.saturating_add(issued) >= self.max_concurrent_enemies {
                debug!(live, cap = self.max_concurrent_enemies, "enemy cap reached");
                break;
            }

            let hard = self.roll_hard_enemy();
            match self.spawn_enemy(hard, out) {
                Ok(()) => issued += 1,
                Err(error) => {
                    self.stalled_spawns = self.stalled_spawns.saturating_add(1);
                    warn!(round = self.round, %error, "spawn stalled");
                    break;
                }
            }
        }

        if issued == 0 && self.spawned_this_round >= self.enemies_target && live == 0 {
            self.finish_round();
        }
    }

    /// Consumes whole cadence periods from the accumulator, never more than `owed`.
    fn resolve_decision_points(&mut self, owed: u32) -> u32 {
        if self.spawn_delay.is_zero() {
            self.accumulator = Duration::ZERO;
            return 1;
        }

        let delay = self.spawn_delay.as_nanos();
        let accumulated = self.accumulator.as_nanos();
        let remainder = accumulated % delay;
        self.accumulator = Duration::from_nanos(u64::try_from(remainder).unwrap_or(u64::MAX));

        let crossed = (accumulated / delay).min(u128::from(owed));
        u32::try_from(crossed).unwrap_or(owed)
    }

    fn roll_hard_enemy(&mut self) -> bool {
        let probability = self.hard_enemy_chance.probability(self.round);
        probability > 0.0 && self.rng.gen_bool(probability)
    }

    fn finish_round(&mut self) {
        info!(
            round = self.round,
            spawned = self.spawned_this_round,
            "round cleared"
        );
        self.phase = RoundPhase::Cooldown;
        self.cooldown_remaining = self.cooldown;
    }

    fn registered_templates(&self) -> impl Iterator<Item = EnemyTemplateId> + '_ {
        self.basic_enemies
            .iter()
            .chain(self.hard_enemies.iter())
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_single_decision_point_without_delay() {
        let config = Config::new(Vec::new(), 1).with_spawn_delay(Duration::ZERO);
        let mut scheduler = RoundScheduler::new(config);
        scheduler.accumulator = Duration::from_secs(10);
        assert_eq!(scheduler.resolve_decision_points(5), 1);
        assert!(scheduler.accumulator.is_zero());
    }

    #[test]
    fn resolves_decision_points_and_keeps_remainder() {
        let config = Config::new(Vec::new(), 1).with_spawn_delay(Duration::from_millis(400));
        let mut scheduler = RoundScheduler::new(config);
        scheduler.accumulator = Duration::from_millis(1_000);
        assert_eq!(scheduler.resolve_decision_points(5), 2);
        assert_eq!(scheduler.accumulator, Duration::from_millis(200));
    }

    #[test]
    fn decision_points_are_capped_by_owed_spawns() {
        let config = Config::new(Vec::new(), 1).with_spawn_delay(Duration::from_nanos(1));
        let mut scheduler = RoundScheduler::new(config);
        scheduler.accumulator = Duration::from_secs(3_600);
        assert_eq!(scheduler.resolve_decision_points(7), 7);
        assert!(scheduler.accumulator.is_zero());
    }

    #[test]
    fn hard_enemy_probability_scales_and_caps() {
        let chance = HardEnemyChance::scaling(0.1, 0.35);
        assert_eq!(chance.probability(0), 0.0);
        assert!((chance.probability(2) - 0.2).abs() < 1e-6);
        assert!((chance.probability(9) - 0.35).abs() < 1e-6);
        assert_eq!(HardEnemyChance::scaling(1.0, 4.0).probability(3), 1.0);
        assert_eq!(HardEnemyChance::NEVER.probability(100), 0.0);
    }

    #[test]
    fn never_policy_does_not_consume_randomness() {
        let mut scheduler = RoundScheduler::new(Config::new(Vec::new(), 7));
        scheduler.round = 12;
        assert!(!scheduler.roll_hard_enemy());
    }
}
