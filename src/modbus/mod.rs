// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-battery-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Modbus communication module
//!
//! This module provides the Modbus TCP server through which external systems
//! read the latest battery telemetry and, in `indexed_list` mode, select the
//! telemetry file to mirror.
//!
//! ## Key Components
//!
//! - `TelemetryModbusServer`: the per-connection service answering requests
//!   from the shared register block.
//! - `serve_registers`: accept loop handing every connection its own service.
//!
//! ## Usage
//!
//! ```no_run
//! use rust_battery_telemetry::modbus::serve_registers;
//! use rust_battery_telemetry::utility::RegisterBlock;
//! use tokio::net::TcpListener;
//!
//! # async fn run() -> std::io::Result<()> {
//! let registers = RegisterBlock::default();
//! let listener = TcpListener::bind("0.0.0.0:502").await?;
//! serve_registers(listener, registers).await?;
//! # Ok(())
//! # }
//! ```

pub mod modbus_server;
pub use modbus_server::{serve_registers, TelemetryModbusServer};
