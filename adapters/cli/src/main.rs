#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs Gravity Defence headlessly.

use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use clap::Parser;
use gravity_defence_cli::{Autopilot, JsonProgressStore, Simulation, SimulationConfig};
use gravity_defence_core::{Command, Event, ProgressStore};
use gravity_defence_world::query;

/// Headless Gravity Defence run simulator.
#[derive(Debug, Parser)]
#[command(name = "gravity-defence", version)]
struct Cli {
    /// TOML map and tuning; the bundled map is used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the seed of every random stream.
    #[arg(long)]
    seed: Option<u64>,
    /// Number of simulation steps to run.
    #[arg(long, default_value_t = 6_000)]
    ticks: u32,
    /// Simulated milliseconds per step.
    #[arg(long, default_value_t = 50)]
    tick_ms: u64,
    /// JSON file holding progress between runs.
    #[arg(long)]
    save: Option<PathBuf>,
    /// Let the scripted player build, mine, pick upgrades and restart runs.
    #[arg(long)]
    autopilot: bool,
}

/// Entry point for the Gravity Defence command-line interface.
fn main() -> Result<()> {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();

    let cli = Cli::parse();
    let mut config = match cli.config.as_deref() {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::builtin()?,
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    let shield_cost = config.world.economy.shield_expansion_cost;
    let store = cli
        .save
        .map(|path| Box::new(JsonProgressStore::new(path)) as Box<dyn ProgressStore>);
    let mut simulation = Simulation::new(config, store);
    let mut autopilot = cli.autopilot.then(|| Autopilot::new(shield_cost));

    let dt = Duration::from_millis(cli.tick_ms.max(1));
    let mut inputs = vec![Command::StartRun];
    let mut waves_cleared = 0_u32;
    for _ in 0..cli.ticks {
        let events = simulation.step(dt, std::mem::take(&mut inputs));
        waves_cleared += events
            .iter()
            .filter(|event| matches!(event, Event::WaveCompleted { .. }))
            .count() as u32;
        if let Some(autopilot) = autopilot.as_mut() {
            autopilot.plan(simulation.world(), &events, &mut inputs);
        }
    }

    let world = simulation.world();
    let balances = query::balances(world);
    let parts = query::ship_parts(world);
    log::info!(
        "finished at wave {} after {} clears; primary {}, mining {}/{}, permanent {}, ship parts {}/{}",
        simulation.wave_director().wave(),
        waves_cleared,
        balances.primary,
        balances.mining_a,
        balances.mining_b,
        query::permanent_currency(world),
        parts.collected,
        parts.required
    );
    if let Some(autopilot) = autopilot {
        log::info!(
            "autopilot finished {} runs ({} victories)",
            autopilot.victories() + autopilot.defeats(),
            autopilot.victories()
        );
    }
    Ok(())
}
