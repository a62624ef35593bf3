// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-battery-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Battery telemetry documents
//!
//! ## Key Components
//!
//! - [`TelemetryRecord`]: the `temperature` / `humidity` / `status` fields read
//!   back from a JSON file and encoded into holding registers.
//! - [`CabinetGenerator`]: random cabinet readings (trays of cells with
//!   voltage and temperature).
//! - [`TelemetryWriter`]: writes readings as JSON lines or one file per reading.
//! - [`TelemetrySimulator`]: periodic generator/writer loop.

pub mod cabinet;
pub mod record;
pub mod simulator;
pub mod writer;

pub use cabinet::{CabinetGenerator, CabinetReading, CellReading, ReadingSummary, TrayReading};
pub use record::{RecordError, StatusCode, TelemetryRecord, RECORD_REGISTER_COUNT};
pub use simulator::TelemetrySimulator;
pub use writer::TelemetryWriter;
