// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-battery-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use anyhow::{Context, Result};
use clap::Parser;
use rust_battery_telemetry::config::SelectionMode;
use rust_battery_telemetry::sync::RegisterLayout;
use std::net::SocketAddr;
use tokio_modbus::prelude::*;

/// Modbus client for reading the telemetry holding registers of the battery bridge
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Modbus server address
    #[clap(long, default_value = "127.0.0.1")]
    address: String,

    /// Modbus server port
    #[clap(long, default_value = "502")]
    port: u16,

    /// Register layout used by the server
    #[clap(long, value_enum, default_value = "latest_by_mtime")]
    mode: SelectionMode,

    /// Write this file index to the control register before reading (indexed_list mode only)
    #[clap(long)]
    set_index: Option<u16>,

    /// Delay in milliseconds between the index write and the read, leaving the sync loop time to react
    #[clap(long, default_value = "2500")]
    settle_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    // Parse command line arguments
    let args = Args::parse();
    let layout = RegisterLayout::for_mode(args.mode);

    // Format server address
    let socket_addr: SocketAddr = format!("{}:{}", args.address, args.port)
        .parse()
        .with_context(|| format!("Invalid socket address {}:{}", args.address, args.port))?;
    println!("Connecting to Modbus server at {}", socket_addr);

    // Create TCP transport
    let mut ctx = tcp::connect(socket_addr).await?;

    if let Some(index) = args.set_index {
        let control_address = layout
            .control_address
            .context("--set-index requires --mode indexed_list")?;
        println!(
            "Selecting file index {} through register {}",
            index, control_address
        );
        ctx.write_single_register(control_address, index).await??;
        tokio::time::sleep(std::time::Duration::from_millis(args.settle_ms)).await;
    }

    let quantity = layout.required_registers() as u16;
    println!("Reading {} holding registers starting at address 0", quantity);
    let response = ctx.read_holding_registers(0, quantity).await??;
    println!("Raw register values: {:?}", response);

    let Some(record) = layout.decode_record(&response) else {
        anyhow::bail!(
            "Server returned {} registers, {} were requested",
            response.len(),
            quantity
        );
    };
    if let Some(index) = layout.control_index(&response) {
        println!("Selected index: {}", index);
    }
    println!("Temperature: {:.2} °C", record.temperature);
    println!("Humidity: {:.2} %", record.humidity);
    println!("Status: {:?}", record.status);

    ctx.disconnect().await?;
    Ok(())
}
