// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! In-process history store. State is shared between every connection to the
//! same environment and lost when the connector is dropped.

use std::{
	collections::{BTreeMap, BTreeSet, HashMap, HashSet},
	sync::Arc,
};

use parking_lot::RwLock;
use sluice_core::{
	interface::{HistoryConnector, HistoryStore},
	model::{ApprovalRecord, ExecutionEntry, HistorySummary, MigrationRecord, PendingApproval, Role},
};
use sluice_type::{MigrationStatus, Version};
use tracing::instrument;
use uuid::Uuid;

use crate::{Result, backend::check_transition, error::StoreError};

#[derive(Debug, Default)]
struct MemoryState {
	records: BTreeMap<Version, MigrationRecord>,
	approvals: BTreeMap<(Version, Role), ApprovalRecord>,
	executions: Vec<ExecutionEntry>,
	execution_ids: HashSet<Uuid>,
}

/// Connection to one environment's in-memory ledger.
#[derive(Debug, Clone)]
pub struct MemoryHistory {
	environment: String,
	state: Arc<RwLock<MemoryState>>,
}

impl MemoryHistory {
	pub fn new(environment: impl Into<String>) -> Self {
		Self {
			environment: environment.into(),
			state: Arc::new(RwLock::new(MemoryState::default())),
		}
	}
}

impl HistoryStore for MemoryHistory {
	fn environment(&self) -> &str {
		&self.environment
	}

	fn summarize(&self) -> Result<HistorySummary> {
		let state = self.state.read();
		Ok(HistorySummary::from_records(state.records.values()))
	}

	fn recent_records(&self, limit: usize) -> Result<Vec<MigrationRecord>> {
		let state = self.state.read();
		let mut records: Vec<MigrationRecord> = state.records.values().cloned().collect();
		records.sort_by(|a, b| b.applied_at.cmp(&a.applied_at).then_with(|| a.version.cmp(&b.version)));
		records.truncate(limit);
		Ok(records)
	}

	fn pending_approvals(&self) -> Result<Vec<PendingApproval>> {
		let state = self.state.read();
		Ok(state
			.records
			.values()
			.filter(|r| r.status == MigrationStatus::PendingApproval)
			.map(|r| PendingApproval {
				version: r.version.clone(),
				description: r.description.clone(),
				risk_level: r.risk_level,
				approval_count: state.approvals.keys().filter(|(v, _)| *v == r.version).count(),
			})
			.collect())
	}

	fn applied_versions(&self) -> Result<BTreeSet<Version>> {
		let state = self.state.read();
		Ok(state
			.records
			.values()
			.filter(|r| r.status == MigrationStatus::Applied)
			.map(|r| r.version.clone())
			.collect())
	}

	fn find_record(&self, version: &Version) -> Result<Option<MigrationRecord>> {
		Ok(self.state.read().records.get(version).cloned())
	}

	#[instrument(name = "store::memory::write_record", level = "debug", skip(self, record), fields(version = %record.version, status = %record.status))]
	fn write_record(&self, record: &MigrationRecord) -> Result<()> {
		let mut state = self.state.write();
		check_transition(state.records.get(&record.version).map(|r| r.status), record)?;
		state.records.insert(record.version.clone(), record.clone());
		Ok(())
	}

	fn approvals(&self, version: &Version) -> Result<Vec<ApprovalRecord>> {
		let state = self.state.read();
		Ok(state.approvals.values().filter(|a| a.version == *version).cloned().collect())
	}

	#[instrument(name = "store::memory::upsert_approval", level = "debug", skip(self, approval), fields(version = %approval.version, role = %approval.approver_role))]
	fn upsert_approval(&self, approval: &ApprovalRecord) -> Result<()> {
		let mut state = self.state.write();
		state.approvals.insert((approval.version.clone(), approval.approver_role.clone()), approval.clone());
		Ok(())
	}

	#[instrument(name = "store::memory::record_execution", level = "debug", skip(self, entry, record), fields(execution_id = %entry.execution_id))]
	fn record_execution(&self, entry: &ExecutionEntry, record: &MigrationRecord) -> Result<()> {
		let mut state = self.state.write();
		if state.execution_ids.contains(&entry.execution_id) {
			return Ok(());
		}

		check_transition(state.records.get(&record.version).map(|r| r.status), record)?;
		state.execution_ids.insert(entry.execution_id);
		state.executions.push(entry.clone());
		state.records.insert(record.version.clone(), record.clone());
		Ok(())
	}

	fn executions(&self, version: &Version) -> Result<Vec<ExecutionEntry>> {
		let state = self.state.read();
		Ok(state.executions.iter().filter(|e| e.version == *version).cloned().collect())
	}
}

/// Hands out connections to in-memory ledgers, one per configured
/// environment. Environments can be marked unreachable to exercise the
/// degraded paths.
#[derive(Debug, Default)]
pub struct MemoryConnector {
	environments: RwLock<HashMap<String, MemoryHistory>>,
	unreachable: RwLock<HashSet<String>>,
}

impl MemoryConnector {
	pub fn new<I, S>(environments: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let connector = Self::default();
		for name in environments {
			connector.add_environment(name);
		}
		connector
	}

	pub fn add_environment(&self, name: impl Into<String>) {
		let name = name.into();
		self.environments.write().entry(name.clone()).or_insert_with(|| MemoryHistory::new(name));
	}

	pub fn set_reachable(&self, environment: &str, reachable: bool) {
		let mut unreachable = self.unreachable.write();
		if reachable {
			unreachable.remove(environment);
		} else {
			unreachable.insert(environment.to_string());
		}
	}

	pub(crate) fn history(&self, environment: &str) -> Result<MemoryHistory> {
		if self.unreachable.read().contains(environment) {
			return Err(StoreError::Unavailable {
				environment: environment.to_string(),
				reason: "environment marked unreachable".to_string(),
			}
			.into());
		}

		self.environments.read().get(environment).cloned().ok_or_else(|| {
			StoreError::UnknownEnvironment {
				environment: environment.to_string(),
			}
			.into()
		})
	}
}

impl HistoryConnector for MemoryConnector {
	fn connect(&self, environment: &str) -> Result<Box<dyn HistoryStore>> {
		Ok(Box::new(self.history(environment)?))
	}
}

#[cfg(test)]
mod tests {
	use chrono::{TimeZone, Utc};
	use sluice_core::model::{FailureReason, MigrationDescriptor};
	use sluice_type::RiskLevel;

	use super::*;

	fn descriptor(version: &str, risk: RiskLevel) -> MigrationDescriptor {
		let mut d = MigrationDescriptor::new(version);
		d.description = format!("migration {}", version);
		d.risk_level = risk;
		d
	}

	fn approval(version: &str, role: Role, name: &str, comments: &str) -> ApprovalRecord {
		ApprovalRecord {
			version: Version::from(version),
			approver_role: role,
			approver_name: name.to_string(),
			approved_at: Utc::now(),
			comments: comments.to_string(),
		}
	}

	fn applied(version: &str, day: u32) -> MigrationRecord {
		let mut record = MigrationRecord::pending(&descriptor(version, RiskLevel::Low));
		record.status = MigrationStatus::Applied;
		record.applied_at = Some(Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap());
		record
	}

	fn entry(version: &str, status: MigrationStatus) -> ExecutionEntry {
		ExecutionEntry {
			execution_id: Uuid::now_v7(),
			version: Version::from(version),
			status,
			exit_code: Some(0),
			failure: None,
			duration_ms: 10,
			executed_by: "dana".to_string(),
			executed_at: Utc::now(),
			forced: false,
			stdout: String::new(),
			stderr: String::new(),
		}
	}

	#[test]
	fn test_approval_upsert_keeps_one_row_per_role() {
		let store = MemoryHistory::new("staging");
		store.upsert_approval(&approval("v1", Role::DataOpsLead, "alice", "first")).unwrap();
		store.upsert_approval(&approval("v1", Role::DataOpsLead, "alice", "second")).unwrap();
		store.upsert_approval(&approval("v1", Role::Dba, "dana", "ok")).unwrap();

		let approvals = store.approvals(&Version::from("v1")).unwrap();
		assert_eq!(approvals.len(), 2);
		let lead = approvals.iter().find(|a| a.approver_role == Role::DataOpsLead).unwrap();
		assert_eq!(lead.comments, "second");
	}

	#[test]
	fn test_pending_approvals_join_counts() {
		let store = MemoryHistory::new("staging");
		store.write_record(&MigrationRecord::pending(&descriptor("v1", RiskLevel::High))).unwrap();
		store.write_record(&applied("v0", 1)).unwrap();
		store.upsert_approval(&approval("v1", Role::DataOpsLead, "alice", "ok")).unwrap();

		let pending = store.pending_approvals().unwrap();
		assert_eq!(pending.len(), 1);
		assert_eq!(pending[0].version.as_str(), "v1");
		assert_eq!(pending[0].risk_level, RiskLevel::High);
		assert_eq!(pending[0].approval_count, 1);
	}

	#[test]
	fn test_recent_records_newest_first() {
		let store = MemoryHistory::new("staging");
		store.write_record(&applied("v1", 1)).unwrap();
		store.write_record(&applied("v3", 3)).unwrap();
		store.write_record(&applied("v2", 2)).unwrap();
		store.write_record(&MigrationRecord::pending(&descriptor("v4", RiskLevel::Low))).unwrap();

		let recent: Vec<String> =
			store.recent_records(3).unwrap().into_iter().map(|r| r.version.to_string()).collect();
		assert_eq!(recent, vec!["v3", "v2", "v1"]);
	}

	#[test]
	fn test_applied_cannot_go_back_to_pending() {
		let store = MemoryHistory::new("staging");
		store.write_record(&applied("v1", 1)).unwrap();

		let err = store.write_record(&MigrationRecord::pending(&descriptor("v1", RiskLevel::Low))).unwrap_err();
		assert_eq!(err.code(), "STORE_002");
		assert_eq!(store.find_record(&Version::from("v1")).unwrap().unwrap().status, MigrationStatus::Applied);
	}

	#[test]
	fn test_record_execution_is_idempotent() {
		let store = MemoryHistory::new("staging");
		let mut record = MigrationRecord::pending(&descriptor("v1", RiskLevel::Low));
		record.status = MigrationStatus::Failed;
		record.failure = Some(FailureReason::ExecutionTimeout);
		let entry = entry("v1", MigrationStatus::Failed);

		store.record_execution(&entry, &record).unwrap();
		store.record_execution(&entry, &record).unwrap();

		assert_eq!(store.executions(&Version::from("v1")).unwrap().len(), 1);
		assert_eq!(store.summarize().unwrap().failed, 1);
	}

	#[test]
	fn test_connector_isolates_environments() {
		let connector = MemoryConnector::new(["staging", "production"]);
		connector.connect("staging").unwrap().write_record(&applied("v1", 1)).unwrap();

		assert_eq!(connector.connect("staging").unwrap().summarize().unwrap().applied, 1);
		assert_eq!(connector.connect("production").unwrap().summarize().unwrap().applied, 0);
	}

	#[test]
	fn test_connector_unreachable_and_unknown() {
		let connector = MemoryConnector::new(["staging"]);
		connector.set_reachable("staging", false);
		assert_eq!(connector.connect("staging").err().unwrap().code(), "STORE_001");

		connector.set_reachable("staging", true);
		assert!(connector.connect("staging").is_ok());
		assert_eq!(connector.connect("qa").err().unwrap().code(), "CONFIG_001");
	}
}
