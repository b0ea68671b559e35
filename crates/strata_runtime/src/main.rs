//! Strata Runtime
//!
//! Harness binary: builds a world from settings, runs the simulation for a
//! number of ticks and reports tracker and sweep statistics.

mod simulation;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use strata_services::Settings;

use crate::simulation::Simulation;

#[derive(Parser)]
#[command(name = "strata")]
#[command(about = "Runs the collision and entity tracking harness")]
struct Args {
    /// Settings JSON file; defaults are used when omitted
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Overrides the tick count from the settings
    #[arg(long)]
    ticks: Option<u32>,

    /// Prints the effective settings as JSON and exits
    #[arg(long)]
    print_settings: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings =
        Settings::load_or_default(args.settings.as_deref()).context("loading settings")?;
    if let Some(ticks) = args.ticks {
        settings.harness.ticks = ticks;
    }

    if args.print_settings {
        println!("{}", settings.to_json()?);
        return Ok(());
    }

    strata_services::logging::init(&settings.log_filter);
    tracing::info!("Strata v{}", strata_core::VERSION);

    let mut simulation = Simulation::new(&settings).context("populating world")?;
    tracing::info!(
        entities = simulation.entity_count(),
        listeners = simulation.listener_count(),
        "world populated"
    );

    simulation.run(settings.harness.ticks).context("simulation aborted")?;
    simulation.report();
    Ok(())
}
