// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-battery-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Telemetry file output
//!
//! Two layouts are supported:
//!
//! * [`SimulatorOutput::AppendLines`]: every reading is appended as one compact
//!   JSON line to a single log file (JSON Lines).
//! * [`SimulatorOutput::FilePerInterval`]: every reading gets its own
//!   pretty-printed, timestamped `.json` file, which is what the register
//!   bridge watches.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use log::debug;

use super::cabinet::CabinetReading;
use crate::config::{SimulatorConfig, SimulatorOutput};

/// Writes cabinet readings to disk according to the simulator configuration
#[derive(Debug, Clone)]
pub struct TelemetryWriter {
    output: SimulatorOutput,
    directory: PathBuf,
    append_file_name: String,
    file_prefix: String,
}

impl TelemetryWriter {
    pub fn from_config(config: &SimulatorConfig) -> Self {
        Self {
            output: config.output,
            directory: config.output_directory.clone(),
            append_file_name: config.append_file_name.clone(),
            file_prefix: config.file_prefix.clone(),
        }
    }

    /// Directory receiving the telemetry files
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Write one reading, creating the output directory if needed
    ///
    /// ### Returns
    ///
    /// The path of the file that received the reading.
    pub fn write(&self, reading: &CabinetReading) -> Result<PathBuf> {
        fs::create_dir_all(&self.directory).with_context(|| {
            format!(
                "Failed to create telemetry directory {}",
                self.directory.display()
            )
        })?;

        match self.output {
            SimulatorOutput::AppendLines => self.append_line(reading),
            SimulatorOutput::FilePerInterval => self.write_new_file(reading),
        }
    }

    fn append_line(&self, reading: &CabinetReading) -> Result<PathBuf> {
        let path = self.directory.join(&self.append_file_name);
        let mut line =
            serde_json::to_string(reading).context("Failed to serialize cabinet reading")?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open {} for appending", path.display()))?;
        file.write_all(line.as_bytes())
            .with_context(|| format!("Failed to append reading to {}", path.display()))?;

        debug!("Appended reading to {}", path.display());
        Ok(path)
    }

    fn write_new_file(&self, reading: &CabinetReading) -> Result<PathBuf> {
        let file_name = format!(
            "{}_{}.json",
            self.file_prefix,
            Local::now().format("%Y%m%d_%H%M%S_%6f")
        );
        let path = self.directory.join(file_name);
        // Written under a name without the .json suffix first so a poller never
        // picks up a half-written document.
        let staging = path.with_extension("json.tmp");

        let contents =
            serde_json::to_string_pretty(reading).context("Failed to serialize cabinet reading")?;
        fs::write(&staging, contents)
            .with_context(|| format!("Failed to write {}", staging.display()))?;
        fs::rename(&staging, &path)
            .with_context(|| format!("Failed to move reading into {}", path.display()))?;

        debug!("Wrote reading to {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::cabinet::CabinetGenerator;
    use tempfile::tempdir;

    fn config_for(dir: &Path, output: SimulatorOutput) -> SimulatorConfig {
        SimulatorConfig {
            output,
            output_directory: dir.to_path_buf(),
            ..SimulatorConfig::default()
        }
    }

    #[test]
    fn test_append_lines() -> Result<()> {
        let dir = tempdir()?;
        let config = config_for(&dir.path().join("nested"), SimulatorOutput::AppendLines);
        let writer = TelemetryWriter::from_config(&config);
        let mut generator = CabinetGenerator::with_seed(&config, 5);

        let first = writer.write(&generator.next_reading())?;
        let second = writer.write(&generator.next_reading())?;
        assert_eq!(first, second);
        assert_eq!(first.file_name().unwrap(), "battery_data.log");

        let contents = fs::read_to_string(&first)?;
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let reading: CabinetReading = serde_json::from_str(line)?;
            assert_eq!(reading.trays.len(), 3);
        }
        Ok(())
    }

    #[test]
    fn test_file_per_interval() -> Result<()> {
        let dir = tempdir()?;
        let config = config_for(dir.path(), SimulatorOutput::FilePerInterval);
        let writer = TelemetryWriter::from_config(&config);
        let mut generator = CabinetGenerator::with_seed(&config, 6);

        let path = writer.write(&generator.next_reading())?;
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("battery_"));
        assert!(name.ends_with(".json"));

        // No staging file left behind
        let entries: Vec<_> = fs::read_dir(dir.path())?.collect();
        assert_eq!(entries.len(), 1);

        let reading: CabinetReading = serde_json::from_str(&fs::read_to_string(&path)?)?;
        assert!(reading.summary.is_some());
        Ok(())
    }
}
