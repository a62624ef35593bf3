// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-battery-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! File-to-register synchronization
//!
//! ## Key Components
//!
//! - [`locator`]: finds the telemetry file to mirror, either the most recently
//!   modified one or an entry of a sorted list captured at startup.
//! - [`SyncLoop`]: the polling state machine writing the selected record into
//!   the shared [`RegisterBlock`](crate::utility::RegisterBlock).
//!
//! ## Register Map
//!
//! ### `latest_by_mtime`
//!
//! | Register Address | Description | Scaling |
//! |-----------------|-------------|---------|
//! | 0 | Temperature | ×100 |
//! | 1 | Humidity | ×100 |
//! | 2 | Status code | 0=unknown, 1=OK, 2=FAIL |
//! | 3-9 | Unused | - |
//!
//! ### `indexed_list`
//!
//! | Register Address | Description | Scaling |
//! |-----------------|-------------|---------|
//! | 0 | File index (written by clients) | - |
//! | 1 | Temperature | ×100 |
//! | 2 | Humidity | ×100 |
//! | 3 | Status code | 0=unknown, 1=OK, 2=FAIL |
//! | 4-9 | Unused | - |

pub mod error;
pub mod locator;
pub mod sync_loop;

pub use error::SyncError;
pub use sync_loop::{PollState, RegisterLayout, Selection, SyncLoop, TickOutcome};
