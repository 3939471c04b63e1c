#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless wave shooter match.

mod session;

use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::session::{MatchSettings, Session};

/// Runs a scripted wave shooter match without rendering.
#[derive(Debug, Parser)]
#[command(name = "wave-shooter", version, about, long_about = None)]
struct Args {
    /// TOML file holding `[spawning]` settings and `[[items]]` blueprints.
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Seed for the round scheduler, overriding the settings file.
    #[arg(long)]
    seed: Option<u64>,
    /// Simulated length of the match in seconds.
    #[arg(long, default_value_t = 120)]
    duration_secs: u64,
    /// Length of one simulation tick in milliseconds.
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u64).range(1..))]
    tick_millis: u64,
}

/// Entry point for the wave shooter command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let settings = match &args.settings {
        Some(path) => MatchSettings::load(path)?,
        None => MatchSettings::default(),
    };
    let mut session = Session::new(settings, args.seed)?;
    println!("{}", session.banner());

    let tick = Duration::from_millis(args.tick_millis);
    let ticks = args.duration_secs.saturating_mul(1_000) / args.tick_millis;
    for _ in 0..ticks {
        session.step(tick);
    }

    let stats = session.finish();
    println!("rounds reached:  {}", stats.rounds_reached);
    println!("enemies spawned: {}", stats.enemies_spawned);
    println!("enemies killed:  {}", stats.enemies_killed);
    println!("shots fired:     {}", stats.shots_fired);
    println!("reloads:         {}", stats.reloads);
    println!("grenades thrown: {}", stats.grenades_thrown);
    println!("sounds played:   {}", stats.sounds_played);
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
