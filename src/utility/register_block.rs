// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-battery-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Holding register block shared between the sync loop and the Modbus server
//!
//! This module provides the in-memory table of 16-bit holding registers that
//! backs the Modbus TCP interface. The same block is handed to the file sync
//! loop (which writes the data registers) and to every Modbus connection
//! (which reads all registers and may write the control register).
//!
//! Every `read` and `write` call takes the lock once, so a reader never sees a
//! half-applied batch. Nothing spans two calls: a client reading register 1 and
//! then register 2 may observe two different updates.

use std::sync::{Arc, Mutex, MutexGuard};

use log::debug;
use thiserror::Error;

/// Number of holding registers exposed by default
pub const DEFAULT_REGISTER_COUNT: u16 = 10;

/// Errors raised by register block accesses
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegisterError {
    #[error("{count} register(s) starting at address {address} exceed block size {size}")]
    OutOfRange {
        address: u16,
        count: usize,
        size: usize,
    },
}

/// A thread-safe block of holding registers
///
/// Cloning the block is cheap and every clone shares the same table.
///
/// ### Examples
///
/// ```
/// use rust_battery_telemetry::utility::RegisterBlock;
///
/// let block = RegisterBlock::new(10);
/// block.write(1, &[2350, 4520, 1]).unwrap();
/// assert_eq!(block.read(1, 3).unwrap(), vec![2350, 4520, 1]);
/// assert!(block.write(1, &[0; 10]).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct RegisterBlock {
    registers: Arc<Mutex<Vec<u16>>>,
}

impl RegisterBlock {
    /// Create a block of `size` registers, all initialised to zero
    pub fn new(size: u16) -> Self {
        Self {
            registers: Arc::new(Mutex::new(vec![0; size.into()])),
        }
    }

    /// Number of registers in the block
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True for a zero-sized block, which rejects every access
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read `count` consecutive registers starting at `address`
    ///
    /// ### Errors
    ///
    /// Returns [`RegisterError::OutOfRange`] if `address + count` exceeds the
    /// block size.
    pub fn read(&self, address: u16, count: u16) -> Result<Vec<u16>, RegisterError> {
        let registers = self.lock();
        let range = checked_range(registers.len(), address, count.into())?;
        Ok(registers[range].to_vec())
    }

    /// Overwrite `values.len()` consecutive registers starting at `address`
    ///
    /// The whole batch is applied under a single lock. On error the block is
    /// left untouched.
    ///
    /// ### Errors
    ///
    /// Returns [`RegisterError::OutOfRange`] if the batch does not fit.
    pub fn write(&self, address: u16, values: &[u16]) -> Result<(), RegisterError> {
        let mut registers = self.lock();
        let range = checked_range(registers.len(), address, values.len())?;
        registers[range].copy_from_slice(values);
        debug!(
            "Wrote {} register(s) starting at address {}: {:?}",
            values.len(),
            address,
            values
        );
        Ok(())
    }

    /// Copy of the whole block
    pub fn snapshot(&self) -> Vec<u16> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u16>> {
        // A panic while holding the lock cannot leave a torn batch behind,
        // copy_from_slice either ran entirely or not at all.
        self.registers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for RegisterBlock {
    fn default() -> Self {
        Self::new(DEFAULT_REGISTER_COUNT)
    }
}

fn checked_range(
    size: usize,
    address: u16,
    count: usize,
) -> Result<std::ops::Range<usize>, RegisterError> {
    let start = usize::from(address);
    let end = start + count;
    if end > size {
        return Err(RegisterError::OutOfRange {
            address,
            count,
            size,
        });
    }
    Ok(start..end)
}
