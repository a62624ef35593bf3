// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-battery-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Rust Battery Telemetry library
//!
//! This library bridges battery cabinet telemetry written as JSON files into
//! Modbus TCP holding registers, and can simulate such a cabinet.
//!
//! ## Modules
//!
//! - [`config`]: YAML configuration validated against a JSON schema
//! - [`daemon`]: background task orchestration
//! - [`modbus`]: Modbus TCP server over the shared register block
//! - [`sync`]: directory polling and register mirroring
//! - [`telemetry`]: telemetry record parsing and the cabinet simulator
//! - [`utility`]: the shared register block

pub mod config;
pub mod daemon;
pub mod modbus;
pub mod sync;
pub mod telemetry;
pub mod utility;
