// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	collections::BTreeSet,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
};

use sluice_core::{
	interface::{HistoryConnector, HistoryStore},
	model::{ApprovalRecord, ExecutionEntry, HistorySummary, MigrationRecord, PendingApproval},
};
use sluice_store::MemoryConnector;
use sluice_type::{
	Error, Result, Version,
	error::diagnostic::store::{query_failed, unavailable},
};

/// Every environment is unreachable.
#[derive(Debug, Default)]
pub struct UnreachableConnector;

impl HistoryConnector for UnreachableConnector {
	fn connect(&self, environment: &str) -> Result<Box<dyn HistoryStore>> {
		Err(Error(unavailable(environment, "connection refused")))
	}
}

/// Wraps a [`MemoryConnector`]. The first `failures` calls to
/// `record_execution` are applied and then reported as failed, the way a
/// lost commit acknowledgement looks to the caller.
pub struct FlakyConnector {
	inner: MemoryConnector,
	remaining: Arc<AtomicUsize>,
	execution_writes: Arc<AtomicUsize>,
}

impl FlakyConnector {
	pub fn new(inner: MemoryConnector, failures: usize) -> Self {
		Self {
			inner,
			remaining: Arc::new(AtomicUsize::new(failures)),
			execution_writes: Arc::new(AtomicUsize::new(0)),
		}
	}

	pub fn inner(&self) -> &MemoryConnector {
		&self.inner
	}

	/// Calls to `record_execution`, including the failed ones.
	pub fn execution_writes(&self) -> usize {
		self.execution_writes.load(Ordering::SeqCst)
	}
}

impl HistoryConnector for FlakyConnector {
	fn connect(&self, environment: &str) -> Result<Box<dyn HistoryStore>> {
		Ok(Box::new(FlakyHistory {
			inner: self.inner.connect(environment)?,
			remaining: self.remaining.clone(),
			execution_writes: self.execution_writes.clone(),
		}))
	}
}

struct FlakyHistory {
	inner: Box<dyn HistoryStore>,
	remaining: Arc<AtomicUsize>,
	execution_writes: Arc<AtomicUsize>,
}

impl HistoryStore for FlakyHistory {
	fn environment(&self) -> &str {
		self.inner.environment()
	}

	fn summarize(&self) -> Result<HistorySummary> {
		self.inner.summarize()
	}

	fn recent_records(&self, limit: usize) -> Result<Vec<MigrationRecord>> {
		self.inner.recent_records(limit)
	}

	fn pending_approvals(&self) -> Result<Vec<PendingApproval>> {
		self.inner.pending_approvals()
	}

	fn applied_versions(&self) -> Result<BTreeSet<Version>> {
		self.inner.applied_versions()
	}

	fn find_record(&self, version: &Version) -> Result<Option<MigrationRecord>> {
		self.inner.find_record(version)
	}

	fn write_record(&self, record: &MigrationRecord) -> Result<()> {
		self.inner.write_record(record)
	}

	fn approvals(&self, version: &Version) -> Result<Vec<ApprovalRecord>> {
		self.inner.approvals(version)
	}

	fn upsert_approval(&self, approval: &ApprovalRecord) -> Result<()> {
		self.inner.upsert_approval(approval)
	}

	fn record_execution(&self, entry: &ExecutionEntry, record: &MigrationRecord) -> Result<()> {
		self.execution_writes.fetch_add(1, Ordering::SeqCst);
		self.inner.record_execution(entry, record)?;

		let failed = self.remaining.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok();
		if failed {
			return Err(Error(query_failed("record_execution", "connection reset before commit acknowledgement")));
		}
		Ok(())
	}

	fn executions(&self, version: &Version) -> Result<Vec<ExecutionEntry>> {
		self.inner.executions(version)
	}
}

#[cfg(test)]
mod tests {
	use chrono::Utc;
	use sluice_core::model::MigrationDescriptor;
	use sluice_type::MigrationStatus;
	use uuid::Uuid;

	use super::*;

	#[test]
	fn test_unreachable() {
		let err = UnreachableConnector.connect("production").err().unwrap();
		assert_eq!(err.code(), "STORE_001");
	}

	#[test]
	fn test_flaky_write_is_applied_then_reported() {
		let connector = FlakyConnector::new(MemoryConnector::new(["staging"]), 1);
		let store = connector.connect("staging").unwrap();

		let mut record = MigrationRecord::pending(&MigrationDescriptor::new("v1"));
		record.status = MigrationStatus::Applied;
		let entry = ExecutionEntry {
			execution_id: Uuid::now_v7(),
			version: Version::from("v1"),
			status: MigrationStatus::Applied,
			exit_code: Some(0),
			failure: None,
			duration_ms: 1,
			executed_by: "dana".to_string(),
			executed_at: Utc::now(),
			forced: false,
			stdout: String::new(),
			stderr: String::new(),
		};

		assert_eq!(store.record_execution(&entry, &record).unwrap_err().code(), "STORE_003");
		assert!(store.record_execution(&entry, &record).is_ok());

		assert_eq!(connector.execution_writes(), 2);
		assert_eq!(store.executions(&Version::from("v1")).unwrap().len(), 1);
	}
}
