// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-battery-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

// Main entry point for the battery telemetry Modbus bridge
use anyhow::Result;
use clap::Parser;
use log::info;
use rust_battery_telemetry::config::{self, utils, Config, SelectionMode};
use rust_battery_telemetry::daemon::Daemon;

use std::path::PathBuf;
use tokio::signal;

/// Battery telemetry bridge exposing the latest JSON reading over Modbus TCP
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory watched for telemetry JSON files
    #[arg(long)]
    directory: Option<PathBuf>,

    /// File selection policy
    #[arg(long, value_enum)]
    mode: Option<SelectionMode>,

    /// Delay between two directory scans in milliseconds
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Path to configuration file (YAML format)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Validate the configuration file and exit
    #[arg(long)]
    validate_config: Option<PathBuf>,

    /// Output the configuration JSON schema and exit
    #[arg(long)]
    show_config_schema: bool,

    /// Modbus server address (overrides config)
    #[arg(long)]
    modbus_address: Option<String>,

    /// Modbus server port (overrides config)
    #[arg(long)]
    modbus_port: Option<u16>,

    /// Also run the cabinet simulator, writing one file per interval into the watched directory
    #[arg(long)]
    simulate: bool,

    /// Enable verbose logging (debug level)
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Disable all logging output
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logger with appropriate level based on verbose and quiet flags
    let log_level = if args.quiet {
        log::LevelFilter::Off
    } else if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if args.show_config_schema {
        return config::output_config_schema();
    }

    if let Some(validate_path) = args.validate_config {
        if !validate_path.exists() {
            return Err(anyhow::anyhow!(
                "Configuration file does not exist: {}",
                validate_path.display()
            ));
        }

        Config::from_file(&validate_path)
            .map_err(|err| anyhow::anyhow!("Configuration validation failed: {}", err))?;
        println!("Configuration file is valid: {}", validate_path.display());
        return Ok(());
    }

    // Load configuration
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("config.yaml"));
    let mut config = Config::from_file(&config_path)?;

    // Apply command line overrides
    config.apply_args(
        args.directory.clone(),
        args.mode,
        args.poll_interval_ms,
        args.modbus_address.clone(),
        args.modbus_port,
        args.simulate,
    );
    utils::validate_specific_rules(&config)
        .map_err(|err| anyhow::anyhow!("Invalid command line override: {}", err))?;

    info!("Starting in daemon mode");
    let mut daemon = Daemon::new();
    daemon.launch(&config).await?;

    // Wait for termination signal
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received shutdown signal, terminating daemon");
            daemon.shutdown();
            daemon.join().await?;
        }
        Err(err) => {
            eprintln!("Error waiting for shutdown signal: {}", err);
        }
    }

    Ok(())
}
