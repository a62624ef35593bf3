// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-battery-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Polling loop mirroring telemetry files into holding registers
//!
//! Every tick the loop determines the current selection (a file path in
//! [`SelectionMode::LatestByMtime`], the control register value in
//! [`SelectionMode::IndexedList`]) and compares it to the previous one. Only a
//! changed selection is loaded and written, as a single batch, into the
//! register block.
//!
//! A selection that fails to load is still remembered: the zero fallback is
//! written once and the file is not retried until the selection changes.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::{task, time};

use super::error::SyncError;
use super::locator;
use crate::config::{SelectionMode, SyncConfig};
use crate::telemetry::{TelemetryRecord, RECORD_REGISTER_COUNT};
use crate::utility::RegisterBlock;

/// Placement of the control and data registers for a selection mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterLayout {
    /// Register holding the file index written by clients, if any
    pub control_address: Option<u16>,
    /// First of the three data registers
    pub data_address: u16,
    /// Number of zeroed registers, starting at `data_address`, when the
    /// control index is out of range
    pub out_of_range_fallback_len: usize,
}

impl RegisterLayout {
    /// `[0]=temperature, [1]=humidity, [2]=status`
    pub const LATEST_BY_MTIME: Self = Self {
        control_address: None,
        data_address: 0,
        out_of_range_fallback_len: RECORD_REGISTER_COUNT,
    };

    /// `[0]=control index, [1]=temperature, [2]=humidity, [3]=status`
    pub const INDEXED_LIST: Self = Self {
        control_address: Some(0),
        data_address: 1,
        out_of_range_fallback_len: 9,
    };

    pub fn for_mode(mode: SelectionMode) -> Self {
        match mode {
            SelectionMode::LatestByMtime => Self::LATEST_BY_MTIME,
            SelectionMode::IndexedList => Self::INDEXED_LIST,
        }
    }

    /// Minimum register block size able to hold this layout
    pub fn required_registers(&self) -> usize {
        let data_end = usize::from(self.data_address)
            + RECORD_REGISTER_COUNT.max(self.out_of_range_fallback_len);
        let control_end = self
            .control_address
            .map_or(0, |address| usize::from(address) + 1);
        data_end.max(control_end)
    }

    /// Decode the record held in `registers`, read from address 0
    ///
    /// Returns `None` when `registers` is too short to hold the data registers.
    pub fn decode_record(&self, registers: &[u16]) -> Option<TelemetryRecord> {
        let start = usize::from(self.data_address);
        let data: &[u16; RECORD_REGISTER_COUNT] = registers
            .get(start..start + RECORD_REGISTER_COUNT)?
            .try_into()
            .ok()?;
        Some(TelemetryRecord::from_registers(data))
    }

    /// Control index held in `registers`, read from address 0
    pub fn control_index(&self, registers: &[u16]) -> Option<u16> {
        self.control_address
            .and_then(|address| registers.get(usize::from(address)).copied())
    }
}

/// What a tick selected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    File(PathBuf),
    Index(u16),
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::File(path) => write!(f, "{}", path.display()),
            Selection::Index(index) => write!(f, "index {}", index),
        }
    }
}

/// Change detection state, owned by the sync loop
#[derive(Debug, Default)]
pub struct PollState {
    last_selected: Option<Selection>,
}

impl PollState {
    /// Selection processed by the last changed tick
    pub fn last_selected(&self) -> Option<&Selection> {
        self.last_selected.as_ref()
    }

    fn is_unchanged(&self, selection: &Selection) -> bool {
        self.last_selected.as_ref() == Some(selection)
    }
}

/// Result of a tick that found something to select
#[derive(Debug)]
pub enum TickOutcome {
    /// Same selection as the previous tick, nothing written
    Unchanged(Selection),
    /// The selected record was written to the data registers
    Updated {
        selection: Selection,
        values: [u16; RECORD_REGISTER_COUNT],
    },
    /// The selection could not be loaded and the zero fallback was written
    Fallback {
        selection: Selection,
        cause: SyncError,
    },
}

enum FileSelector {
    LatestByMtime { directory: PathBuf },
    IndexedList {
        files: Vec<PathBuf>,
        control_address: u16,
    },
}

/// The file-to-register synchronization loop
pub struct SyncLoop {
    registers: RegisterBlock,
    selector: FileSelector,
    layout: RegisterLayout,
    state: PollState,
    poll_interval: Duration,
}

impl SyncLoop {
    /// Build the loop described by `config`
    ///
    /// In [`SelectionMode::IndexedList`] the directory is listed once, here.
    ///
    /// ### Errors
    ///
    /// Returns [`SyncError::DirectoryUnreadable`] if the index cannot be built.
    pub fn new(config: &SyncConfig, registers: RegisterBlock) -> Result<Self, SyncError> {
        let poll_interval = Duration::from_millis(config.poll_interval_ms);
        match config.mode {
            SelectionMode::LatestByMtime => Ok(Self::latest_by_mtime(
                &config.directory,
                registers,
                poll_interval,
            )),
            SelectionMode::IndexedList => {
                Self::indexed_list(&config.directory, registers, poll_interval)
            }
        }
    }

    /// Mirror the most recently modified file of `directory` into registers 0..=2
    pub fn latest_by_mtime(
        directory: &Path,
        registers: RegisterBlock,
        poll_interval: Duration,
    ) -> Self {
        Self {
            registers,
            selector: FileSelector::LatestByMtime {
                directory: directory.to_path_buf(),
            },
            layout: RegisterLayout::LATEST_BY_MTIME,
            state: PollState::default(),
            poll_interval,
        }
    }

    /// Mirror the file selected by register 0 into registers 1..=3
    pub fn indexed_list(
        directory: &Path,
        registers: RegisterBlock,
        poll_interval: Duration,
    ) -> Result<Self, SyncError> {
        let files =
            locator::build_index(directory).map_err(|source| SyncError::DirectoryUnreadable {
                directory: directory.to_path_buf(),
                source,
            })?;
        info!(
            "Indexed {} telemetry file(s) in {}",
            files.len(),
            directory.display()
        );
        for (index, path) in files.iter().enumerate() {
            debug!("  [{}] {}", index, path.display());
        }

        let layout = RegisterLayout::INDEXED_LIST;
        Ok(Self {
            registers,
            selector: FileSelector::IndexedList {
                files,
                control_address: layout.control_address.unwrap_or_default(),
            },
            layout,
            state: PollState::default(),
            poll_interval,
        })
    }

    pub fn layout(&self) -> RegisterLayout {
        self.layout
    }

    pub fn state(&self) -> &PollState {
        &self.state
    }

    /// Files captured at startup in indexed mode, empty otherwise
    pub fn indexed_files(&self) -> &[PathBuf] {
        match &self.selector {
            FileSelector::IndexedList { files, .. } => files,
            FileSelector::LatestByMtime { .. } => &[],
        }
    }

    /// Run a single poll tick
    ///
    /// ### Returns
    ///
    /// The [`TickOutcome`] when something was selected.
    ///
    /// ### Errors
    ///
    /// * [`SyncError::NoFileFound`] / [`SyncError::DirectoryUnreadable`] when
    ///   nothing could be selected; registers and poll state are untouched
    /// * [`SyncError::RegisterBoundsViolation`] when the register block is too
    ///   small for the layout
    pub fn tick(&mut self) -> Result<TickOutcome, SyncError> {
        let selection = self.select()?;
        if self.state.is_unchanged(&selection) {
            return Ok(TickOutcome::Unchanged(selection));
        }
        self.state.last_selected = Some(selection.clone());

        let path = match self.resolve(&selection) {
            Ok(path) => path,
            Err(cause) => {
                self.write_zeros(self.layout.out_of_range_fallback_len)?;
                return Ok(TickOutcome::Fallback { selection, cause });
            }
        };

        match TelemetryRecord::from_file(&path) {
            Ok(record) => {
                let values = record.to_registers();
                self.registers.write(self.layout.data_address, &values)?;
                Ok(TickOutcome::Updated { selection, values })
            }
            Err(source) => {
                self.write_zeros(RECORD_REGISTER_COUNT)?;
                Ok(TickOutcome::Fallback {
                    selection,
                    cause: SyncError::ReadOrParseFailure { path, source },
                })
            }
        }
    }

    /// Poll every `poll_interval` until `running` is cleared
    ///
    /// Ticks run on the blocking thread pool so a slow filesystem never stalls
    /// the runtime workers serving Modbus clients. Tick failures are logged and
    /// never end the loop.
    pub async fn run(mut self, running: Arc<AtomicBool>) {
        info!(
            "Sync loop started, polling every {:?} with layout {:?}",
            self.poll_interval, self.layout
        );
        let poll_interval = self.poll_interval;
        while running.load(Ordering::SeqCst) {
            let (sync_loop, result) = match task::spawn_blocking(move || {
                let result = self.tick();
                (self, result)
            })
            .await
            {
                Ok(ticked) => ticked,
                Err(e) => {
                    error!("Sync tick task failed, stopping sync loop: {}", e);
                    return;
                }
            };
            self = sync_loop;

            match result {
                Ok(TickOutcome::Unchanged(selection)) => {
                    debug!("No change, still on {}", selection);
                }
                Ok(TickOutcome::Updated { selection, values }) => {
                    info!("New selection {}, registers set to {:?}", selection, values);
                }
                Ok(TickOutcome::Fallback { selection, cause }) => {
                    warn!("Selection {} unusable, registers zeroed: {}", selection, cause);
                }
                Err(e @ SyncError::NoFileFound { .. }) => debug!("{}", e),
                Err(e @ SyncError::DirectoryUnreadable { .. }) => warn!("{}", e),
                Err(e) => error!("Sync tick failed: {}", e),
            }
            time::sleep(poll_interval).await;
        }
        info!("Sync loop stopped");
    }

    fn select(&self) -> Result<Selection, SyncError> {
        match &self.selector {
            FileSelector::LatestByMtime { directory } => match locator::select_latest(directory) {
                Ok(Some(path)) => Ok(Selection::File(path)),
                Ok(None) => Err(SyncError::NoFileFound {
                    directory: directory.clone(),
                }),
                Err(source) => Err(SyncError::DirectoryUnreadable {
                    directory: directory.clone(),
                    source,
                }),
            },
            FileSelector::IndexedList {
                control_address, ..
            } => {
                let index = self.registers.read(*control_address, 1)?[0];
                Ok(Selection::Index(index))
            }
        }
    }

    fn resolve(&self, selection: &Selection) -> Result<PathBuf, SyncError> {
        match selection {
            Selection::File(path) => Ok(path.clone()),
            Selection::Index(index) => {
                let files = self.indexed_files();
                locator::select_by_index(files, usize::from(*index))
                    .map(Path::to_path_buf)
                    .ok_or(SyncError::IndexOutOfRange {
                        index: *index,
                        len: files.len(),
                    })
            }
        }
    }

    fn write_zeros(&self, count: usize) -> Result<(), SyncError> {
        self.registers
            .write(self.layout.data_address, &vec![0; count])?;
        Ok(())
    }
}
