// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-battery-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Battery cabinet simulator configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::telemetry::cabinet::{CELL_VOLTAGE_MAX, CELL_VOLTAGE_MIN};

/// File layout produced by the simulator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum SimulatorOutput {
    /// Append one JSON line per reading to `append_file_name`
    AppendLines,
    /// Write one timestamped `.json` file per reading
    FilePerInterval,
}

/// Configuration for the simulated battery cabinet.
///
/// The simulator is disabled by default; a real telemetry source is expected
/// to populate the watched directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Run the simulator as a daemon task next to the bridge
    pub enabled: bool,

    /// Serial number reported for the cabinet
    pub cabinet_serial_number: String,

    /// Serial numbers of the trays, in reporting order
    pub tray_serial_numbers: Vec<String>,

    /// Number of cells in every tray
    pub cells_per_tray: u32,

    /// Delay between two readings, in milliseconds
    pub interval_ms: u64,

    pub output: SimulatorOutput,

    /// Directory receiving the files
    pub output_directory: PathBuf,

    /// File name used by the `append_lines` output
    pub append_file_name: String,

    /// File name prefix used by the `file_per_interval` output
    pub file_prefix: String,

    /// Add top-level `temperature`, `humidity` and `status` fields
    pub include_summary: bool,

    /// Lowest cell voltage still reported as `OK` in the summary
    pub nominal_voltage_min: f64,

    /// Highest cell voltage still reported as `OK` in the summary
    pub nominal_voltage_max: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cabinet_serial_number: "CAB-12345".to_string(),
            tray_serial_numbers: vec![
                "TRAY-A".to_string(),
                "TRAY-B".to_string(),
                "TRAY-C".to_string(),
            ],
            cells_per_tray: 10,
            interval_ms: 5000,
            output: SimulatorOutput::FilePerInterval,
            output_directory: PathBuf::from("jsondata"),
            append_file_name: "battery_data.log".to_string(),
            file_prefix: "battery".to_string(),
            include_summary: true,
            nominal_voltage_min: CELL_VOLTAGE_MIN,
            nominal_voltage_max: CELL_VOLTAGE_MAX,
        }
    }
}
