#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure bootstrap system that prepares a wave shooter session.

use tracing::{info, warn};
use wave_shooter_core::SpawnPoint;
use wave_shooter_world::{query, World};

/// Produces the data systems need once the level has been loaded.
#[derive(Debug, Default)]
pub struct Bootstrap;

impl Bootstrap {
    /// Derives the banner that should be shown when the session starts.
    #[must_use]
    pub fn welcome_banner<'world>(&self, world: &'world World) -> &'world str {
        query::welcome_banner(world)
    }

    /// Collects every spawn point marker placed in the level.
    ///
    /// An empty result is reported but not treated as an error; the round
    /// scheduler stalls its spawns until markers exist.
    #[must_use]
    pub fn discover_spawn_points(&self, world: &World) -> Vec<SpawnPoint> {
        let spawn_points = query::spawn_points(world);
        if spawn_points.is_empty() {
            warn!("level contains no spawn points");
        } else {
            info!(count = spawn_points.len(), "discovered spawn points");
        }
        spawn_points
    }
}
