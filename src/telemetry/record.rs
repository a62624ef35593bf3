// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-battery-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Telemetry record extraction and register encoding
//!
//! A telemetry file is a JSON object carrying at least `temperature`,
//! `humidity` and `status`. Any other field is ignored. Extraction is best
//! effort: a missing or non-numeric measurement reads as `0.0` and an
//! unrecognised status reads as [`StatusCode::Unknown`].
//!
//! ## Register encoding
//!
//! | Offset | Value | Scaling |
//! |--------|-------|---------|
//! | 0 | Temperature | ×100, truncated toward zero |
//! | 1 | Humidity | ×100, truncated toward zero |
//! | 2 | Status code | 0=unknown, 1=OK, 2=FAIL |

use std::fs;
use std::io;
use std::path::Path;

use serde_json::{Map, Value};
use thiserror::Error;

/// Number of registers produced by [`TelemetryRecord::to_registers`]
pub const RECORD_REGISTER_COUNT: usize = 3;

/// Errors raised while loading a telemetry file
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("failed to read telemetry file: {0}")]
    Io(#[from] io::Error),

    #[error("malformed telemetry JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("telemetry document is not a JSON object")]
    NotAnObject,
}

/// Status reported by a telemetry record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u16)]
pub enum StatusCode {
    #[default]
    Unknown = 0,
    Ok = 1,
    Fail = 2,
}

impl StatusCode {
    /// Map a status string to its code. Anything but `"OK"` and `"FAIL"` is unknown.
    pub fn from_status(status: &str) -> Self {
        match status {
            "OK" => StatusCode::Ok,
            "FAIL" => StatusCode::Fail,
            _ => StatusCode::Unknown,
        }
    }

    /// Register value of this status
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Status stored in a register. Unknown codes read as `Unknown`.
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => StatusCode::Ok,
            2 => StatusCode::Fail,
            _ => StatusCode::Unknown,
        }
    }
}

/// The fields of a telemetry document mirrored into Modbus registers
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TelemetryRecord {
    /// Temperature in °C
    pub temperature: f64,
    /// Relative humidity in %
    pub humidity: f64,
    pub status: StatusCode,
}

impl TelemetryRecord {
    /// Load and extract a record from a JSON file
    ///
    /// ### Errors
    ///
    /// Fails if the file cannot be read, is not valid JSON, or is valid JSON
    /// but not an object.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RecordError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&contents)
    }

    /// Extract a record from a JSON document
    pub fn from_json_str(contents: &str) -> Result<Self, RecordError> {
        let value: Value = serde_json::from_str(contents)?;
        let object = value.as_object().ok_or(RecordError::NotAnObject)?;
        Ok(Self::from_object(object))
    }

    /// Extract a record from an already parsed JSON object
    pub fn from_object(object: &Map<String, Value>) -> Self {
        let status = object
            .get("status")
            .and_then(Value::as_str)
            .map(StatusCode::from_status)
            .unwrap_or_default();

        Self {
            temperature: number_field(object, "temperature"),
            humidity: number_field(object, "humidity"),
            status,
        }
    }

    /// Encode the record as `[temperature*100, humidity*100, status]`
    pub fn to_registers(&self) -> [u16; RECORD_REGISTER_COUNT] {
        [
            scale_to_register(self.temperature),
            scale_to_register(self.humidity),
            self.status.code(),
        ]
    }

    /// Decode registers written by [`TelemetryRecord::to_registers`]
    ///
    /// Measurements are read back as signed values, so readings above 327.67
    /// cannot be told apart from negative ones.
    pub fn from_registers(registers: &[u16; RECORD_REGISTER_COUNT]) -> Self {
        Self {
            temperature: register_to_value(registers[0]),
            humidity: register_to_value(registers[1]),
            status: StatusCode::from_code(registers[2]),
        }
    }
}

fn number_field(object: &Map<String, Value>, key: &str) -> f64 {
    object.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

/// Scale a measurement by 100 into a 16-bit register value
///
/// The scaled value is truncated toward zero. Negative values are stored as
/// 16-bit two's complement (saturating at -327.68), positive values saturate
/// at 655.35. NaN encodes as 0.
pub fn scale_to_register(value: f64) -> u16 {
    let scaled = (value * 100.0).trunc();
    if scaled < 0.0 {
        (scaled as i16) as u16
    } else {
        scaled as u16
    }
}

fn register_to_value(register: u16) -> f64 {
    f64::from(register as i16) / 100.0
}
