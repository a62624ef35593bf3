// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-battery-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Daemon integration tests: sync loop, Modbus server and simulator running
//! together, observed through a real Modbus TCP client.

use anyhow::Result;
use std::fs;
use std::time::Duration;
use tempfile::tempdir;
use tokio::time;
use tokio_modbus::prelude::*;

use rust_battery_telemetry::config::{Config, SelectionMode};
use rust_battery_telemetry::daemon::Daemon;

fn test_config(directory: &std::path::Path, mode: SelectionMode) -> Config {
    let mut config = Config::default();
    config.sync.directory = directory.to_path_buf();
    config.sync.mode = mode;
    config.sync.poll_interval_ms = 20;
    config.modbus.address = "127.0.0.1".to_string();
    // Let the OS pick a free port
    config.modbus.port = 0;
    config
}

#[tokio::test]
async fn test_latest_reading_is_served_over_modbus() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempdir()?;
    fs::write(
        dir.path().join("reading.json"),
        r#"{"timestamp": "2025-01-01T00:00:00", "temperature": 23.5, "humidity": 45.2, "status": "OK"}"#,
    )?;

    let mut daemon = Daemon::new();
    daemon
        .launch(&test_config(dir.path(), SelectionMode::LatestByMtime))
        .await?;
    let socket_addr = daemon.modbus_addr().expect("modbus server is enabled");

    time::sleep(Duration::from_millis(200)).await;

    let mut ctx = tcp::connect(socket_addr).await?;
    let data = ctx.read_holding_registers(0, 3).await??;
    assert_eq!(data, vec![2350, 4520, 1]);
    ctx.disconnect().await?;

    daemon.shutdown();
    daemon.join().await?;

    Ok(())
}

#[tokio::test]
async fn test_client_selects_file_by_index() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempdir()?;
    fs::write(
        dir.path().join("a.json"),
        r#"{"temperature": 10.0, "humidity": 11.0, "status": "OK"}"#,
    )?;
    fs::write(
        dir.path().join("b.json"),
        r#"{"temperature": 20.0, "humidity": 21.0, "status": "FAIL"}"#,
    )?;

    let mut daemon = Daemon::new();
    daemon
        .launch(&test_config(dir.path(), SelectionMode::IndexedList))
        .await?;
    let socket_addr = daemon.modbus_addr().expect("modbus server is enabled");

    time::sleep(Duration::from_millis(200)).await;

    let mut ctx = tcp::connect(socket_addr).await?;
    assert_eq!(
        ctx.read_holding_registers(0, 4).await??,
        vec![0, 1000, 1100, 1]
    );

    ctx.write_single_register(0, 1).await??;
    time::sleep(Duration::from_millis(200)).await;
    assert_eq!(
        ctx.read_holding_registers(0, 4).await??,
        vec![1, 2000, 2100, 2]
    );

    ctx.write_single_register(0, 9).await??;
    time::sleep(Duration::from_millis(200)).await;
    assert_eq!(
        ctx.read_holding_registers(0, 10).await??,
        vec![9, 0, 0, 0, 0, 0, 0, 0, 0, 0]
    );
    ctx.disconnect().await?;

    daemon.shutdown();
    daemon.join().await?;

    Ok(())
}

#[tokio::test]
async fn test_simulator_feeds_the_sync_loop() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempdir()?;

    let mut config = test_config(dir.path(), SelectionMode::LatestByMtime);
    config.modbus.enabled = false;
    config.simulator.interval_ms = 50;
    config.apply_args(None, None, None, None, None, true);

    let mut daemon = Daemon::new();
    daemon.launch(&config).await?;
    assert!(daemon.modbus_addr().is_none());

    time::sleep(Duration::from_millis(400)).await;

    // Simulated cabinet temperatures stay within 20..40 °C
    let registers = daemon.registers().read(0, 3)?;
    assert!(
        (2000..=4000).contains(&registers[0]),
        "temperature register {}",
        registers[0]
    );
    assert!(registers[2] == 1 || registers[2] == 2);

    daemon.shutdown();
    daemon.join().await?;

    let written = fs::read_dir(dir.path())?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "json"))
        .count();
    assert!(written >= 2);

    Ok(())
}

#[tokio::test]
async fn test_unreadable_index_directory_fails_launch() -> Result<()> {
    let dir = tempdir()?;
    let mut config = test_config(&dir.path().join("missing"), SelectionMode::IndexedList);
    config.modbus.enabled = false;

    let mut daemon = Daemon::new();
    assert!(daemon.launch(&config).await.is_err());

    Ok(())
}
