// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-battery-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use anyhow::Result;
use rust_battery_telemetry::config::Config;
use std::fs;
use std::path::Path;
use std::sync::Once;
use tempfile::tempdir;

static INIT: Once = Once::new();

// Setup logger for tests
fn setup() {
    INIT.call_once(|| {
        let _ = env_logger::builder()
            .filter_level(log::LevelFilter::Debug)
            .is_test(true)
            .try_init();
    });
}

#[test]
fn test_config_deserialization_error_creates_sample_file() -> Result<()> {
    setup();
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");

    // Valid YAML but wrong structure
    let invalid_yaml = r#"
sync:
  enabled: "true"          # Boolean field with string value
  directory: 12345         # String field with number value
  mode: newest             # Unknown mode
  poll_interval_ms: "fast" # Integer field with string value
"#;
    fs::write(&config_path, invalid_yaml)?;

    let result = Config::from_file(&config_path);
    assert!(result.is_err(), "Config loading should have failed");

    let sample_path = config_path.with_extension("sample.yaml");
    assert!(
        Path::new(&sample_path).exists(),
        "Sample config file was not created"
    );

    // The sample file is itself a valid configuration
    let sample_config = Config::from_file(&sample_path)?;
    assert_eq!(sample_config.modbus.port, 502);

    Ok(())
}

#[test]
fn test_config_validation_error_creates_sample_file() -> Result<()> {
    setup();
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");

    let invalid_config = r#"
modbus:
  enabled: true
  port: 99999  # Port out of range (valid range is 1-65534)
  address: "127.0.0.1"
"#;
    fs::write(&config_path, invalid_config)?;

    let result = Config::from_file(&config_path);
    assert!(result.is_err(), "Config loading should have failed");

    let sample_path = config_path.with_extension("sample.yaml");
    assert!(
        Path::new(&sample_path).exists(),
        "Sample config file was not created"
    );

    Ok(())
}

#[test]
fn test_register_count_too_small_is_rejected() -> Result<()> {
    setup();
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");

    // Schema-valid, but the indexed layout needs ten registers
    let config = r#"
sync:
  enabled: true
  directory: "jsondata"
  mode: indexed_list
  poll_interval_ms: 2000
modbus:
  enabled: true
  port: 502
  address: "0.0.0.0"
  register_count: 4
"#;
    fs::write(&config_path, config)?;

    let err = Config::from_file(&config_path).unwrap_err();
    assert!(err.to_string().contains("at least 10 registers are required"));
    assert!(config_path.with_extension("sample.yaml").exists());

    Ok(())
}

#[test]
fn test_unknown_section_is_rejected() -> Result<()> {
    setup();
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");

    fs::write(&config_path, "visualization:\n  port: 8080\n")?;

    assert!(Config::from_file(&config_path).is_err());

    Ok(())
}
