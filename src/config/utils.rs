// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-battery-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration utilities
//!
//! This module provides utility functions for working with configuration
//! settings, including validation and schema management.

use anyhow::{Context, Result};
use log::debug;

use super::{Config, CONFIG_SCHEMA};
use crate::sync::RegisterLayout;

/// Output the embedded JSON schema to the console.
///
/// This function is called when the `--show-config-schema` flag is provided
/// on the command line.
///
/// # Example
///
/// ```bash
/// ./rust_battery_telemetry --show-config-schema > config_schema.json
/// ```
pub fn output_config_schema() -> Result<()> {
    let schema: serde_json::Value =
        serde_json::from_str(CONFIG_SCHEMA).context("Failed to parse JSON schema")?;

    let formatted_schema =
        serde_json::to_string_pretty(&schema).context("Failed to format JSON schema")?;

    println!("{}", formatted_schema);

    Ok(())
}

/// Check if a string is a valid IP address
///
/// Validates that a string represents a valid IPv4 or IPv6 address,
/// or is one of the special values like "localhost" or "0.0.0.0".
pub fn is_valid_ip_address(addr: &str) -> bool {
    if addr.parse::<std::net::IpAddr>().is_ok() {
        return true;
    }

    // Special cases
    matches!(addr, "localhost" | "::" | "::0" | "0.0.0.0")
}

/// Validates the configuration against rules that the JSON schema cannot express.
///
/// # Validation Rules
///
/// - **Port Range**: the Modbus port is within 1-65534
/// - **Address Format**: a malformed address is only reported at debug level,
///   host names are resolved at bind time
/// - **Register Layout**: the register block is large enough for the layout of
///   the selected sync mode
/// - **Sync Loop**: the watched directory is not empty and the poll interval is positive
/// - **Simulator**: at least one tray and one cell, a positive interval and an
///   ordered nominal voltage window
pub fn validate_specific_rules(config: &Config) -> Result<()> {
    debug!("Performing additional validation checks");

    if config.modbus.port < 1 || config.modbus.port > 65534 {
        anyhow::bail!("Invalid Modbus port number: {}", config.modbus.port);
    }

    if !is_valid_ip_address(&config.modbus.address) {
        debug!(
            "Potentially invalid Modbus address format: {}",
            config.modbus.address
        );
    }

    let layout = RegisterLayout::for_mode(config.sync.mode);
    if usize::from(config.modbus.register_count) < layout.required_registers() {
        anyhow::bail!(
            "Register count {} is too small for {:?} mode, at least {} registers are required",
            config.modbus.register_count,
            config.sync.mode,
            layout.required_registers()
        );
    }

    if config.sync.directory.as_os_str().is_empty() {
        anyhow::bail!("Sync directory must not be empty");
    }

    if config.sync.poll_interval_ms == 0 {
        anyhow::bail!("Sync poll interval must be greater than 0 ms");
    }

    let simulator = &config.simulator;
    if simulator.tray_serial_numbers.is_empty() {
        anyhow::bail!("Simulator needs at least one tray serial number");
    }
    if simulator.cells_per_tray == 0 {
        anyhow::bail!("Simulator needs at least one cell per tray");
    }
    if simulator.interval_ms == 0 {
        anyhow::bail!("Simulator interval must be greater than 0 ms");
    }
    if simulator.nominal_voltage_min > simulator.nominal_voltage_max {
        anyhow::bail!(
            "Simulator nominal voltage window is inverted: {} > {}",
            simulator.nominal_voltage_min,
            simulator.nominal_voltage_max
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SelectionMode;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_specific_rules(&Config::default()).is_ok());
    }

    #[test]
    fn test_is_valid_ip_address() {
        assert!(is_valid_ip_address("127.0.0.1"));
        assert!(is_valid_ip_address("::1"));
        assert!(is_valid_ip_address("localhost"));
        assert!(!is_valid_ip_address("not an address"));
    }

    #[test]
    fn test_register_count_too_small_for_index_mode() {
        let mut config = Config::default();
        config.sync.mode = SelectionMode::IndexedList;
        config.modbus.register_count = 4;
        let err = validate_specific_rules(&config).unwrap_err();
        assert!(err.to_string().contains("at least 10 registers"));

        // The same block is large enough for the mtime layout
        config.sync.mode = SelectionMode::LatestByMtime;
        assert!(validate_specific_rules(&config).is_ok());
    }

    #[test]
    fn test_zero_port_rejected() {
        let mut config = Config::default();
        config.modbus.port = 0;
        assert!(validate_specific_rules(&config).is_err());
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let mut config = Config::default();
        config.sync.poll_interval_ms = 0;
        assert!(validate_specific_rules(&config).is_err());
    }

    #[test]
    fn test_inverted_voltage_window_rejected() {
        let mut config = Config::default();
        config.simulator.nominal_voltage_min = 4.0;
        config.simulator.nominal_voltage_max = 3.5;
        assert!(validate_specific_rules(&config).is_err());
    }
}
