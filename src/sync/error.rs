// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-battery-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::telemetry::RecordError;
use crate::utility::RegisterError;

/// Errors raised while mirroring telemetry files into registers
#[derive(Error, Debug)]
pub enum SyncError {
    /// The directory holds no telemetry file, registers are left as they are
    #[error("no telemetry file found in {}", .directory.display())]
    NoFileFound { directory: PathBuf },

    /// The directory could not be listed, registers are left as they are
    #[error("failed to list {}: {source}", .directory.display())]
    DirectoryUnreadable {
        directory: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The selected file could not be read or parsed, zeros were written
    #[error("failed to load {}: {source}", .path.display())]
    ReadOrParseFailure {
        path: PathBuf,
        #[source]
        source: RecordError,
    },

    /// The control register points outside the indexed files, zeros were written
    #[error("control index {index} is outside the {len} indexed file(s)")]
    IndexOutOfRange { index: u16, len: usize },

    #[error("register bounds violation: {0}")]
    RegisterBoundsViolation(#[from] RegisterError),
}
