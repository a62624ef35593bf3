// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-battery-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration management for the battery telemetry bridge
//!
//! This module provides functionality for loading, validating, and applying
//! configuration settings. The configuration is backed by a YAML file and
//! validated against a JSON schema for robustness.
//!
//! ## Configuration Structure
//!
//! The application's configuration is organized as a nested structure with sections:
//! - `sync`: Settings for the file-to-register synchronization loop
//! - `modbus`: Settings for the Modbus TCP server
//! - `simulator`: Settings for the simulated battery cabinet
//!
//! ## Usage
//!
//! ```no_run
//! use rust_battery_telemetry::config::{Config, SelectionMode};
//! use std::path::Path;
//!
//! // Load config from file, creates a default if not found
//! let mut config = Config::from_file(Path::new("config.yaml")).unwrap();
//!
//! // Apply command line overrides if needed
//! config.apply_args(
//!     Some("/home/pi/jsondata".into()),  // Watched directory
//!     Some(SelectionMode::IndexedList),  // Selection mode
//!     Some(1000),                        // Poll interval (ms)
//!     Some("0.0.0.0".to_string()),       // Modbus address
//!     Some(5020),                        // Modbus port
//!     false,                             // Simulator
//! );
//!
//! println!("Watching {}", config.sync.directory.display());
//! ```

pub mod modbus;
pub mod simulator;
pub mod sync;
pub mod utils;

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, error};
use serde::{Deserialize, Serialize};

pub use modbus::ModbusConfig;
pub use simulator::{SimulatorConfig, SimulatorOutput};
pub use sync::{SelectionMode, SyncConfig};
pub use utils::{is_valid_ip_address, output_config_schema};

/// JSON schema the YAML configuration is validated against
pub(crate) const CONFIG_SCHEMA: &str = include_str!("../../resources/config.schema.json");

/// Root configuration structure for the battery telemetry bridge.
///
/// # Structure
///
/// The configuration is designed to be deserialized from and serialized to YAML
/// using the serde framework. The structure is validated against a JSON schema
/// to ensure all required fields are present and have valid values.
///
/// # Default Values
///
/// Each section uses default values when not explicitly specified in the configuration
/// file, allowing for minimal configuration when custom settings are not required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Settings for the file-to-register synchronization loop.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Settings for the Modbus TCP server.
    #[serde(default)]
    pub modbus: ModbusConfig,

    /// Settings for the simulated battery cabinet.
    #[serde(default)]
    pub simulator: SimulatorConfig,
}

impl Config {
    /// Helper method to create a sample config file when validation fails
    fn create_sample_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        let sample_path = path.with_extension("sample.yaml");
        debug!("Original path: {:?}, Sample path: {:?}", path, sample_path);

        if let Some(parent) = sample_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!("Creating parent directory: {:?}", parent);
                fs::create_dir_all(parent).with_context(|| {
                    format!(
                        "Failed to create parent directory for sample config at {:?}",
                        parent
                    )
                })?;
            }
        }

        Self::default()
            .save_to_file(&sample_path)
            .with_context(|| format!("Failed to save sample config to {:?}", sample_path))?;

        error!(
            "Sample configuration file created at {:?}\nPlease edit and rename it",
            sample_path
        );
        Ok(())
    }

    /// Load configuration from a file
    ///
    /// A missing file is created with the default configuration. A file that
    /// fails schema validation, deserialization or the additional rules of
    /// [`utils::validate_specific_rules`] produces an error and a
    /// `<name>.sample.yaml` file holding the defaults next to it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(
                "Configuration file not found at {:?}, creating default",
                path
            );
            let default_config = Self::default();
            default_config.save_to_file(path)?;
            return Ok(default_config);
        }

        debug!("Loading configuration from {:?}", path);
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file at {:?}", path))?;

        // First step: convert YAML to a generic Value
        let yaml_value: serde_yml::Value = serde_yml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML configuration from {:?}", path))?;

        // Convert to JSON Value for validation
        let json_value = serde_json::to_value(&yaml_value).with_context(|| {
            format!("Failed to convert YAML to JSON for validation: {:?}", path)
        })?;

        let schema: serde_json::Value =
            serde_json::from_str(CONFIG_SCHEMA).context("Failed to parse JSON schema")?;
        let validator = jsonschema::draft202012::options()
            .should_validate_formats(true)
            .build(&schema)?;

        debug!("Validating {} configuration against schema", path.display());
        if let Err(error) = validator.validate(&json_value) {
            error!("Configuration validation error before deserialization");
            Self::create_sample_config(path)?;
            anyhow::bail!("Configuration validation failed: {}", error);
        }

        debug!("Schema validation passed, deserializing into Config structure");
        let config: Config = match serde_yml::from_str(&contents) {
            Ok(config) => config,
            Err(err) => {
                error!("Configuration deserialization error: {}", err);
                if let Err(e) = Self::create_sample_config(path) {
                    error!("Failed to create sample config: {}", e);
                }
                return Err(anyhow::anyhow!(
                    "Failed to deserialize configuration from {}: {}",
                    path.display(),
                    err
                ));
            }
        };

        if let Err(err) = utils::validate_specific_rules(&config) {
            error!("Configuration specific validation error: {}", err);
            Self::create_sample_config(path)?;
            return Err(err);
        }

        Ok(config)
    }

    /// Save the configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml =
            serde_yml::to_string(self).context("Failed to serialize configuration to YAML")?;

        let mut file = File::create(path.as_ref())
            .with_context(|| format!("Failed to create config file at {:?}", path.as_ref()))?;

        file.write_all(yaml.as_bytes())
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Apply command line arguments to override configuration values.
    ///
    /// Only arguments that are provided override the loaded configuration.
    ///
    /// # Parameters
    ///
    /// * `directory` - Directory watched for telemetry files
    /// * `mode` - File selection policy; an interval left at the old mode's
    ///   default switches to the new mode's default unless `poll_interval_ms` is given
    /// * `poll_interval_ms` - Delay between two sync ticks
    /// * `modbus_address` - Network address for the Modbus server
    /// * `modbus_port` - TCP port for the Modbus server
    /// * `simulate` - If true, runs the cabinet simulator into the watched directory
    pub fn apply_args(
        &mut self,
        directory: Option<PathBuf>,
        mode: Option<SelectionMode>,
        poll_interval_ms: Option<u64>,
        modbus_address: Option<String>,
        modbus_port: Option<u16>,
        simulate: bool,
    ) {
        if let Some(directory) = directory {
            debug!("Overriding sync directory from command line: {:?}", directory);
            self.sync.directory = directory;
        }

        if let Some(mode) = mode {
            debug!("Overriding selection mode from command line: {:?}", mode);
            // An interval still at the previous mode's default follows the new mode
            if poll_interval_ms.is_none()
                && self.sync.poll_interval_ms == self.sync.mode.default_poll_interval_ms()
            {
                self.sync.poll_interval_ms = mode.default_poll_interval_ms();
            }
            self.sync.mode = mode;
        }

        if let Some(interval) = poll_interval_ms {
            debug!("Overriding poll interval from command line: {} ms", interval);
            self.sync.poll_interval_ms = interval;
        }

        if let Some(address) = modbus_address {
            debug!("Overriding Modbus address from command line: {}", address);
            self.modbus.address = address;
        }

        if let Some(port) = modbus_port {
            debug!("Overriding Modbus port from command line: {}", port);
            self.modbus.port = port;
        }

        if simulate {
            debug!(
                "Enabling simulator from command line, writing into {:?}",
                self.sync.directory
            );
            self.simulator.enabled = true;
            self.simulator.output = SimulatorOutput::FilePerInterval;
            self.simulator.output_directory = self.sync.directory.clone();
        }
    }
}
