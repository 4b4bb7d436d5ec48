// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::BTreeSet;

use sluice_type::{Result, Version};

use crate::model::{ApprovalRecord, ExecutionEntry, HistorySummary, MigrationRecord, PendingApproval};

/// Ledger of migration executions and approvals for one environment.
///
/// A store value is one connection: it is obtained from a
/// [`HistoryConnector`] at the start of an operation and dropped at its end.
pub trait HistoryStore: Send {
	fn environment(&self) -> &str;

	fn summarize(&self) -> Result<HistorySummary>;

	/// Records sorted by applied timestamp, newest first. Records that were
	/// never applied sort last.
	fn recent_records(&self, limit: usize) -> Result<Vec<MigrationRecord>>;

	fn pending_approvals(&self) -> Result<Vec<PendingApproval>>;

	fn applied_versions(&self) -> Result<BTreeSet<Version>>;

	fn find_record(&self, version: &Version) -> Result<Option<MigrationRecord>>;

	/// Inserts the record or transitions the existing one. Rejects
	/// transitions the ledger does not allow.
	fn write_record(&self, record: &MigrationRecord) -> Result<()>;

	fn approvals(&self, version: &Version) -> Result<Vec<ApprovalRecord>>;

	fn approval_count(&self, version: &Version) -> Result<usize> {
		Ok(self.approvals(version)?.len())
	}

	/// Last write wins per `(version, approver_role)`.
	fn upsert_approval(&self, approval: &ApprovalRecord) -> Result<()>;

	/// Writes the execution entry and the record transition together. A
	/// second call with an already stored `execution_id` is a no-op.
	fn record_execution(&self, entry: &ExecutionEntry, record: &MigrationRecord) -> Result<()>;

	fn executions(&self, version: &Version) -> Result<Vec<ExecutionEntry>>;
}

/// Opens the history store of a named environment. Failure to reach it is
/// reported as `STORE_001`.
pub trait HistoryConnector: Send + Sync {
	fn connect(&self, environment: &str) -> Result<Box<dyn HistoryStore>>;
}
