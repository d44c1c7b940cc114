// PQMS Runner - Headless driver for the PQMS transmission engine
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # PQMS Runner
//!
//! Runs the transmission engine against wall-clock time and prints the
//! final link metrics.
//!
//! ## Usage
//!
//! ```bash
//! # Five cycles on the bridge route
//! pqms-runner --route bridge --cycles 5
//!
//! # Reproducible one-minute run with an export on exit
//! pqms-runner --seed 42 --duration-secs 60 --export-dir ./out
//! ```

mod driver;
mod error;
mod export;

use clap::Parser;
use driver::{DriverConfig, SimulationDriver};
use error::RunnerError;
use pqms::{clock, SimulationConfig, TransmissionEngine};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

/// PQMS transmission simulator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Route key (primary, backup, bridge)
    #[arg(short, long, default_value = "primary")]
    route: String,

    /// Active channels (clamped to the configured maximum)
    #[arg(short, long, default_value = "10")]
    channels: u32,

    /// Stop after this many completed cycles
    #[arg(long)]
    cycles: Option<u64>,

    /// Stop after this many seconds
    #[arg(long)]
    duration_secs: Option<u64>,

    /// Random seed for reproducible metrics
    #[arg(short, long)]
    seed: Option<u64>,

    /// JSON simulation config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Poll interval in milliseconds
    #[arg(long, default_value = "50")]
    tick_ms: u64,

    /// Directory for the export file written on exit
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match args.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };
        EnvFilter::from_default_env().add_directive(level.into())
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("PQMS Runner v{} (engine v{})", env!("CARGO_PKG_VERSION"), pqms::VERSION);

    if let Err(e) = run(args).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), RunnerError> {
    let mut config = match &args.config {
        Some(path) => SimulationConfig::from_file(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }

    let engine = TransmissionEngine::new(config)?;
    let driver = Arc::new(SimulationDriver::new(
        engine,
        DriverConfig {
            route: args.route.clone(),
            channels: args.channels,
            tick: Duration::from_millis(args.tick_ms.max(1)),
            max_cycles: args.cycles,
            max_duration: args.duration_secs.map(Duration::from_secs),
        },
    ));

    // Ctrl-C ends the loop at its next tick
    {
        let driver = Arc::clone(&driver);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupted, stopping");
                driver.stop();
            }
        });
    }

    let summary = driver.run().await;
    info!("Summary: {}", serde_json::to_string(&summary)?);

    let engine = driver.engine();
    let engine = engine.read().await;
    println!("{}", engine.metrics().report());

    if let Some(dir) = &args.export_dir {
        let path = export::write_export(dir, &engine, clock::now_ms())?;
        println!("Export written to {}", path.display());
    }

    Ok(())
}
