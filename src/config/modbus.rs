// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-battery-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Modbus TCP server configuration
//!
//! This module defines the structures for configuring the Modbus TCP server
//! exposing the telemetry holding registers.

use serde::{Deserialize, Serialize};

use crate::utility::register_block::DEFAULT_REGISTER_COUNT;

/// Configuration for the Modbus TCP server component.
///
/// # Fields
///
/// * `enabled` - Flag to enable or disable the Modbus server
/// * `port` - TCP port number for the Modbus server (default: 502)
/// * `address` - Network address for the Modbus server to bind to (default: 0.0.0.0)
/// * `register_count` - Size of the holding register block (default: 10)
///
/// # Example
///
/// ```
/// use rust_battery_telemetry::config::ModbusConfig;
///
/// let modbus_config = ModbusConfig {
///     enabled: true,
///     port: 5020,
///     address: "127.0.0.1".to_string(),
///     register_count: 10,
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModbusConfig {
    /// Flag to enable or disable the Modbus server.
    ///
    /// When disabled the sync loop still maintains the register block, but
    /// nothing is exposed on the network.
    pub enabled: bool,

    /// The TCP port the Modbus server will listen on.
    ///
    /// Valid range is 1-65534. Default value is 502, which is the standard Modbus TCP port
    /// and usually requires elevated privileges.
    pub port: u16,

    /// The network address the Modbus server will bind to.
    ///
    /// Use "0.0.0.0" to bind to all IPv4 interfaces, "127.0.0.1" for local access only.
    pub address: String,

    /// Number of holding registers exposed, addressed 0..register_count-1.
    #[serde(default = "default_register_count")]
    pub register_count: u16,
}

fn default_register_count() -> u16 {
    DEFAULT_REGISTER_COUNT
}

impl Default for ModbusConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 502,
            address: "0.0.0.0".to_string(),
            register_count: DEFAULT_REGISTER_COUNT,
        }
    }
}
