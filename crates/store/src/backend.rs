// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! History backend enum.
//!
//! Dispatches to either the in-memory or the SQLite history implementation.

use std::collections::BTreeSet;

use sluice_core::{
	interface::{HistoryConnector, HistoryStore},
	model::{ApprovalRecord, ExecutionEntry, HistorySummary, MigrationRecord, PendingApproval},
};
use sluice_type::{MigrationStatus, Version};

use crate::{MemoryConnector, MemoryHistory, Result, SqliteConnector, SqliteHistory, error::StoreError};

/// Rejects a record write that the ledger's transition table forbids.
/// Rewriting the current status is allowed.
pub(crate) fn check_transition(current: Option<MigrationStatus>, record: &MigrationRecord) -> Result<()> {
	match current {
		None => Ok(()),
		Some(from) if from == record.status || from.can_transition_to(record.status) => Ok(()),
		Some(from) => Err(StoreError::InvalidTransition {
			version: record.version.to_string(),
			from,
			to: record.status,
		}
		.into()),
	}
}

#[repr(u8)]
pub enum HistoryBackend {
	Memory(MemoryHistory) = 0,
	Sqlite(SqliteHistory) = 1,
}

impl HistoryStore for HistoryBackend {
	#[inline]
	fn environment(&self) -> &str {
		match self {
			Self::Memory(s) => s.environment(),
			Self::Sqlite(s) => s.environment(),
		}
	}

	#[inline]
	fn summarize(&self) -> Result<HistorySummary> {
		match self {
			Self::Memory(s) => s.summarize(),
			Self::Sqlite(s) => s.summarize(),
		}
	}

	#[inline]
	fn recent_records(&self, limit: usize) -> Result<Vec<MigrationRecord>> {
		match self {
			Self::Memory(s) => s.recent_records(limit),
			Self::Sqlite(s) => s.recent_records(limit),
		}
	}

	#[inline]
	fn pending_approvals(&self) -> Result<Vec<PendingApproval>> {
		match self {
			Self::Memory(s) => s.pending_approvals(),
			Self::Sqlite(s) => s.pending_approvals(),
		}
	}

	#[inline]
	fn applied_versions(&self) -> Result<BTreeSet<Version>> {
		match self {
			Self::Memory(s) => s.applied_versions(),
			Self::Sqlite(s) => s.applied_versions(),
		}
	}

	#[inline]
	fn find_record(&self, version: &Version) -> Result<Option<MigrationRecord>> {
		match self {
			Self::Memory(s) => s.find_record(version),
			Self::Sqlite(s) => s.find_record(version),
		}
	}

	#[inline]
	fn write_record(&self, record: &MigrationRecord) -> Result<()> {
		match self {
			Self::Memory(s) => s.write_record(record),
			Self::Sqlite(s) => s.write_record(record),
		}
	}

	#[inline]
	fn approvals(&self, version: &Version) -> Result<Vec<ApprovalRecord>> {
		match self {
			Self::Memory(s) => s.approvals(version),
			Self::Sqlite(s) => s.approvals(version),
		}
	}

	#[inline]
	fn approval_count(&self, version: &Version) -> Result<usize> {
		match self {
			Self::Memory(s) => s.approval_count(version),
			Self::Sqlite(s) => s.approval_count(version),
		}
	}

	#[inline]
	fn upsert_approval(&self, approval: &ApprovalRecord) -> Result<()> {
		match self {
			Self::Memory(s) => s.upsert_approval(approval),
			Self::Sqlite(s) => s.upsert_approval(approval),
		}
	}

	#[inline]
	fn record_execution(&self, entry: &ExecutionEntry, record: &MigrationRecord) -> Result<()> {
		match self {
			Self::Memory(s) => s.record_execution(entry, record),
			Self::Sqlite(s) => s.record_execution(entry, record),
		}
	}

	#[inline]
	fn executions(&self, version: &Version) -> Result<Vec<ExecutionEntry>> {
		match self {
			Self::Memory(s) => s.executions(version),
			Self::Sqlite(s) => s.executions(version),
		}
	}
}

/// Connector selected by configuration.
pub enum BackendConnector {
	Memory(MemoryConnector),
	Sqlite(SqliteConnector),
}

impl BackendConnector {
	pub fn connect_backend(&self, environment: &str) -> Result<HistoryBackend> {
		match self {
			Self::Memory(c) => Ok(HistoryBackend::Memory(c.history(environment)?)),
			Self::Sqlite(c) => Ok(HistoryBackend::Sqlite(c.open(environment)?)),
		}
	}
}

impl HistoryConnector for BackendConnector {
	fn connect(&self, environment: &str) -> Result<Box<dyn HistoryStore>> {
		Ok(Box::new(self.connect_backend(environment)?))
	}
}
