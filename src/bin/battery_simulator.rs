// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-battery-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

// Battery cabinet telemetry simulator
// Writes simulated cabinet readings as JSON into a directory watched by the bridge

use anyhow::Result;
use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::sync::{atomic::AtomicBool, atomic::Ordering, Arc};
use std::time::Duration;

use rust_battery_telemetry::config::{SimulatorConfig, SimulatorOutput};
use rust_battery_telemetry::telemetry::{CabinetGenerator, TelemetrySimulator};

/// Battery cabinet telemetry simulator
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Output directory for the telemetry files
    #[arg(short, long, value_name = "DIR", default_value = "jsondata")]
    output_directory: PathBuf,

    /// Output layout
    #[arg(long, value_enum, default_value = "file_per_interval")]
    output: SimulatorOutput,

    /// Delay between two readings in milliseconds
    #[arg(short, long, default_value_t = 5000)]
    interval_ms: u64,

    /// Cabinet serial number
    #[arg(long, default_value = "CAB-12345")]
    cabinet: String,

    /// Tray serial numbers
    #[arg(long, value_delimiter = ',', default_value = "TRAY-A,TRAY-B,TRAY-C")]
    trays: Vec<String>,

    /// Number of cells per tray
    #[arg(long, default_value_t = 10)]
    cells: u32,

    /// Omit the cabinet-level temperature/humidity/status fields
    #[arg(long, default_value_t = false)]
    no_summary: bool,

    /// Stop after this many readings (runs until Ctrl+C otherwise)
    #[arg(short, long)]
    count: Option<u64>,

    /// Seed for reproducible readings
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );
    let args = Args::parse();

    if args.cells == 0 || args.trays.is_empty() || args.interval_ms == 0 {
        eprintln!("Error: at least one tray, one cell per tray and a non-zero interval are required");
        std::process::exit(1);
    }

    let config = SimulatorConfig {
        enabled: true,
        cabinet_serial_number: args.cabinet,
        tray_serial_numbers: args.trays,
        cells_per_tray: args.cells,
        interval_ms: args.interval_ms,
        output: args.output,
        output_directory: args.output_directory,
        include_summary: !args.no_summary,
        ..SimulatorConfig::default()
    };
    std::fs::create_dir_all(&config.output_directory)?;

    let generator = match args.seed {
        Some(seed) => CabinetGenerator::with_seed(&config, seed),
        None => CabinetGenerator::new(&config),
    };
    let mut simulator = TelemetrySimulator::with_generator(&config, generator);

    if let Some(count) = args.count {
        for i in 0..count {
            let reading = simulator.step()?;
            info!("Reading {}/{} written at {}", i + 1, count, reading.timestamp);
            if i + 1 < count {
                tokio::time::sleep(Duration::from_millis(config.interval_ms)).await;
            }
        }
        return Ok(());
    }

    let running = Arc::new(AtomicBool::new(true));
    let task = tokio::spawn(simulator.run(running.clone()));

    tokio::signal::ctrl_c().await?;
    info!("Received shutdown signal, stopping simulator");
    running.store(false, Ordering::SeqCst);
    task.await?;
    Ok(())
}
