// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-battery-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Simulated battery cabinet readings
//!
//! A cabinet holds a list of trays, each tray holds a fixed number of lithium-ion
//! cells. Every reading samples a voltage and a temperature per cell from
//! uniform distributions:
//!
//! * voltage: 3.0 V to 4.2 V, rounded to 0.01 V
//! * temperature: 20.0 °C to 40.0 °C, rounded to 0.1 °C
//!
//! When enabled, a top-level summary (`temperature`, `humidity`, `status`) is
//! added so the document can be consumed directly by the register bridge.

use chrono::Local;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::SimulatorConfig;

pub const CELL_VOLTAGE_MIN: f64 = 3.0;
pub const CELL_VOLTAGE_MAX: f64 = 4.2;
pub const CELL_TEMPERATURE_MIN: f64 = 20.0;
pub const CELL_TEMPERATURE_MAX: f64 = 40.0;
pub const HUMIDITY_MIN: f64 = 30.0;
pub const HUMIDITY_MAX: f64 = 60.0;

/// One cell measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellReading {
    /// 1-based position of the cell in its tray
    pub cell_index: u32,
    /// Cell voltage in volts
    pub voltage: f64,
    /// Cell temperature in °C
    pub temperature: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrayReading {
    pub tray_serial_number: String,
    pub cells: Vec<CellReading>,
}

/// Cabinet-level values mirrored into the Modbus registers by the bridge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingSummary {
    /// Mean cell temperature in °C
    pub temperature: f64,
    /// Cabinet relative humidity in %
    pub humidity: f64,
    /// `"OK"` or `"FAIL"`
    pub status: String,
}

/// A full cabinet reading as written to disk
///
/// Field order is significant: `timestamp` comes first, then the cabinet serial
/// number, then the trays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CabinetReading {
    pub timestamp: String,
    pub cabinet_serial_number: String,
    pub trays: Vec<TrayReading>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub summary: Option<ReadingSummary>,
}

/// Generator of random cabinet readings
pub struct CabinetGenerator {
    rng: StdRng,
    cabinet_serial_number: String,
    tray_serial_numbers: Vec<String>,
    cells_per_tray: u32,
    include_summary: bool,
    nominal_voltage_min: f64,
    nominal_voltage_max: f64,
}

impl CabinetGenerator {
    /// Create a generator seeded from the operating system
    pub fn new(config: &SimulatorConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Create a generator with a fixed seed, producing a reproducible sequence
    pub fn with_seed(config: &SimulatorConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: &SimulatorConfig, rng: StdRng) -> Self {
        Self {
            rng,
            cabinet_serial_number: config.cabinet_serial_number.clone(),
            tray_serial_numbers: config.tray_serial_numbers.clone(),
            cells_per_tray: config.cells_per_tray,
            include_summary: config.include_summary,
            nominal_voltage_min: config.nominal_voltage_min,
            nominal_voltage_max: config.nominal_voltage_max,
        }
    }

    /// Produce the next reading, timestamped with the local time
    pub fn next_reading(&mut self) -> CabinetReading {
        let trays: Vec<TrayReading> = self
            .tray_serial_numbers
            .clone()
            .into_iter()
            .map(|tray_serial_number| TrayReading {
                tray_serial_number,
                cells: (1..=self.cells_per_tray)
                    .map(|cell_index| self.next_cell(cell_index))
                    .collect(),
            })
            .collect();

        let summary = self.include_summary.then(|| self.summarize(&trays));

        CabinetReading {
            timestamp: Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            cabinet_serial_number: self.cabinet_serial_number.clone(),
            trays,
            summary,
        }
    }

    fn next_cell(&mut self, cell_index: u32) -> CellReading {
        CellReading {
            cell_index,
            voltage: round_to(
                self.rng.random_range(CELL_VOLTAGE_MIN..=CELL_VOLTAGE_MAX),
                2,
            ),
            temperature: round_to(
                self.rng
                    .random_range(CELL_TEMPERATURE_MIN..=CELL_TEMPERATURE_MAX),
                1,
            ),
        }
    }

    fn summarize(&mut self, trays: &[TrayReading]) -> ReadingSummary {
        let cells = trays.iter().flat_map(|tray| tray.cells.iter());

        let (sum, count) = cells
            .clone()
            .fold((0.0, 0usize), |(sum, count), cell| {
                (sum + cell.temperature, count + 1)
            });
        let temperature = if count == 0 {
            0.0
        } else {
            round_to(sum / count as f64, 1)
        };

        let healthy = cells.clone().all(|cell| {
            (self.nominal_voltage_min..=self.nominal_voltage_max).contains(&cell.voltage)
        });

        ReadingSummary {
            temperature,
            humidity: round_to(self.rng.random_range(HUMIDITY_MIN..=HUMIDITY_MAX), 1),
            status: if healthy { "OK" } else { "FAIL" }.to_string(),
        }
    }
}

/// Round `value` to `decimals` decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
