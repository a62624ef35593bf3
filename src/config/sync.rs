// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-battery-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! File-to-register synchronization configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How the sync loop picks the telemetry file to mirror
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Most recently modified `.json` file of the directory, re-evaluated on every tick.
    ///
    /// Registers: 0 = temperature×100, 1 = humidity×100, 2 = status.
    LatestByMtime,

    /// Sorted list of `.json` files captured at startup, indexed by holding register 0.
    ///
    /// Registers: 0 = control index, 1 = temperature×100, 2 = humidity×100, 3 = status.
    IndexedList,
}

impl SelectionMode {
    /// Default poll interval of each mode
    pub fn default_poll_interval_ms(self) -> u64 {
        match self {
            SelectionMode::LatestByMtime => 2000,
            SelectionMode::IndexedList => 1000,
        }
    }
}

/// Configuration of the background loop mirroring telemetry files into registers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Enable or disable the sync loop.
    pub enabled: bool,

    /// Directory watched for `.json` telemetry files (not recursive).
    pub directory: PathBuf,

    /// File selection policy.
    pub mode: SelectionMode,

    /// Delay between two polls of the directory or control register, in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        let mode = SelectionMode::LatestByMtime;
        Self {
            enabled: true,
            directory: PathBuf::from("jsondata"),
            mode,
            poll_interval_ms: mode.default_poll_interval_ms(),
        }
    }
}
