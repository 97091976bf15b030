//! # Tempest Sim
//!
//! Runs a scripted arena fight and prints the summary.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tempest_moves::{load_dir, standard_catalog};
use tempest_sim::{SimConfig, Simulation};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Command line arguments.
#[derive(Debug, Parser)]
#[command(name = "tempest-sim", version, about = "Headless Tempest arena")]
struct Args {
    /// Arena config file
    #[arg(short, long, default_value = "arena.toml")]
    config: PathBuf,

    /// Directory of extra move files
    #[arg(short, long)]
    moves: Option<PathBuf>,

    /// Override the configured tick count
    #[arg(short, long)]
    ticks: Option<u64>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("tempest=info".parse()?))
        .init();

    let args = Args::parse();
    info!("Tempest sim {}", env!("CARGO_PKG_VERSION"));

    let mut config = SimConfig::load_from(&args.config);
    if let Some(ticks) = args.ticks {
        config.ticks = ticks;
        config.validate();
    }

    let mut catalog = standard_catalog(&config.combat).context("built-in moves do not fit the configured pools")?;
    if let Some(dir) = &args.moves {
        let added = load_dir(dir, &mut catalog).with_context(|| format!("loading moves from {}", dir.display()))?;
        info!(added, "Loaded extra moves");
    }

    let mut sim = Simulation::new(&config, Arc::new(catalog));
    let summary = sim.run(config.ticks);

    if args.json {
        println!("{}", summary.to_json()?);
    } else {
        print!("{summary}");
    }
    Ok(())
}
