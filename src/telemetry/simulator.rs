// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-battery-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Periodic battery cabinet simulator
//!
//! Generates a cabinet reading every `interval_ms` and hands it to a
//! [`TelemetryWriter`]. Write failures are logged and the loop carries on with
//! the next interval.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use log::{debug, error, info};
use tokio::time;

use super::cabinet::{CabinetGenerator, CabinetReading};
use super::writer::TelemetryWriter;
use crate::config::SimulatorConfig;

pub struct TelemetrySimulator {
    generator: CabinetGenerator,
    writer: TelemetryWriter,
    interval: Duration,
}

impl TelemetrySimulator {
    pub fn new(config: &SimulatorConfig) -> Self {
        Self::with_generator(config, CabinetGenerator::new(config))
    }

    pub fn with_generator(config: &SimulatorConfig, generator: CabinetGenerator) -> Self {
        Self {
            generator,
            writer: TelemetryWriter::from_config(config),
            interval: Duration::from_millis(config.interval_ms),
        }
    }

    /// Generate and write a single reading
    pub fn step(&mut self) -> anyhow::Result<CabinetReading> {
        let reading = self.generator.next_reading();
        let path = self.writer.write(&reading)?;
        debug!(
            "Cabinet {} reading at {} saved to {}",
            reading.cabinet_serial_number,
            reading.timestamp,
            path.display()
        );
        Ok(reading)
    }

    /// Run until `running` is cleared
    pub async fn run(mut self, running: Arc<AtomicBool>) {
        info!(
            "Telemetry simulator writing to {} every {:?}",
            self.writer.directory().display(),
            self.interval
        );
        while running.load(Ordering::SeqCst) {
            if let Err(e) = self.step() {
                error!("Failed to write simulated telemetry: {:#}", e);
            }
            time::sleep(self.interval).await;
        }
        info!("Telemetry simulator stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulatorOutput;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_run_writes_files_until_stopped() {
        let dir = tempdir().unwrap();
        let config = SimulatorConfig {
            enabled: true,
            output: SimulatorOutput::FilePerInterval,
            output_directory: dir.path().to_path_buf(),
            interval_ms: 20,
            ..SimulatorConfig::default()
        };
        let simulator =
            TelemetrySimulator::with_generator(&config, CabinetGenerator::with_seed(&config, 11));

        let running = Arc::new(AtomicBool::new(true));
        let handle = tokio::spawn(simulator.run(running.clone()));
        time::sleep(Duration::from_millis(150)).await;
        running.store(false, Ordering::SeqCst);
        handle.await.unwrap();

        let written = std::fs::read_dir(dir.path()).unwrap().count();
        assert!(written >= 2, "expected several readings, got {}", written);
    }
}
