//! epmc - Monte Carlo electron transport
//!
//! Runs the configured beam into the configured sample and prints the
//! backscatter totals. An optional first argument overrides the scene path.

use std::process::ExitCode;
use std::sync::Arc;

use epmc::config::AppConfig;
use epmc_core::{run_parallel, MonteCarloSim, ParallelPlan, SceneTemplate, SharedTally, SimEvent};

fn run(config: &AppConfig, scene_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let scene = SceneTemplate::load(scene_path)?.build()?;
    log::info!("Loaded scene '{}' with {} regions", scene.name, scene.regions.len());

    let regions = Arc::new(scene.regions);
    let engine = config.engine.to_engine_config();
    let tally = SharedTally::new();

    let batches = match config.simulation.batches {
        0 => default_batches(),
        n => n,
    };
    let plan = ParallelPlan::new(config.simulation.seed, config.simulation.trajectories, batches);
    let run = run_parallel(plan, |_, ctx| {
        let gun = config.beam.to_gun()?;
        Ok(MonteCarloSim::new(Arc::clone(&regions), gun, ctx)
            .with_config(engine.clone())
            .with_listener(tally.clone()))
    })?;

    let totals = tally.snapshot();
    println!("scene:            {}", scene.name);
    println!("beam energy:      {} eV", config.beam.energy_ev);
    println!("trajectories:     {}", run);
    println!("backscattered:    {}", totals.backscattered);
    println!("backscatter frac: {:.4}", totals.backscatter_fraction());
    if totals.backscattered > 0 {
        println!(
            "mean BSE energy:  {:.1} eV",
            totals.backscattered_energy / totals.backscattered as f64
        );
    }
    println!("secondaries:      {}", totals.secondaries);
    println!("scatters:         {}", totals.events.count(SimEvent::Scatter));
    Ok(())
}

fn default_batches() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

fn main() -> ExitCode {
    let config = AppConfig::load();
    let log_level = config
        .as_ref()
        .map_or_else(|_| "info".to_string(), |c| c.debug.log_level.clone());
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = config.unwrap_or_else(|e| {
        log::warn!("Failed to load config: {}. Using defaults.", e);
        AppConfig::default()
    });
    let scene_path = std::env::args().nth(1).unwrap_or_else(|| config.scene.path.clone());

    match run(&config, &scene_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Simulation failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
