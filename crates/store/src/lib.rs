// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! History store backends.
//!
//! Each environment owns an isolated ledger of migration records, approvals
//! and execution entries. A connector hands out one store value per
//! operation; the value is dropped when the operation ends.

mod backend;
pub mod error;
pub mod memory;
pub mod sqlite;

pub use backend::{BackendConnector, HistoryBackend};
pub use error::StoreError;
pub use memory::{MemoryConnector, MemoryHistory};
pub use sqlite::{DbPath, JournalMode, SqliteConfig, SqliteConnector, SqliteHistory, SynchronousMode};

pub type Result<T> = std::result::Result<T, sluice_type::Error>;
