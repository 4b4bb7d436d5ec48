// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fmt::{Display, Formatter},
	str::FromStr,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sluice_type::{MigrationStatus, RiskLevel, Version};
use uuid::Uuid;

use crate::model::Role;

/// A migration file as read from the catalog. Regenerated on every scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationDescriptor {
	pub version: Version,
	pub description: String,
	pub risk_level: RiskLevel,
	pub estimated_duration: String,
	pub author: String,
	pub created: String,
}

impl MigrationDescriptor {
	pub fn new(version: impl Into<Version>) -> Self {
		Self {
			version: version.into(),
			description: String::new(),
			risk_level: RiskLevel::Low,
			estimated_duration: String::new(),
			author: String::new(),
			created: String::new(),
		}
	}
}

/// Why an execution ended in `FAILED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
	ExecutionTimeout,
	ExecutionFailed,
}

impl FailureReason {
	pub fn as_str(&self) -> &'static str {
		match self {
			FailureReason::ExecutionTimeout => "EXECUTION_TIMEOUT",
			FailureReason::ExecutionFailed => "EXECUTION_FAILED",
		}
	}
}

impl Display for FailureReason {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for FailureReason {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"EXECUTION_TIMEOUT" => Ok(FailureReason::ExecutionTimeout),
			"EXECUTION_FAILED" => Ok(FailureReason::ExecutionFailed),
			other => Err(format!("unknown failure reason '{}'", other)),
		}
	}
}

/// Ledger entry for one migration version in one environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
	pub version: Version,
	pub status: MigrationStatus,
	pub description: String,
	pub risk_level: RiskLevel,
	pub applied_at: Option<DateTime<Utc>>,
	pub execution_ms: Option<u64>,
	pub applied_by: Option<String>,
	pub failure: Option<FailureReason>,
	/// Execution that last transitioned this record, if any.
	pub execution_id: Option<Uuid>,
}

impl MigrationRecord {
	/// A record marking the migration as awaiting approval.
	pub fn pending(descriptor: &MigrationDescriptor) -> Self {
		Self {
			version: descriptor.version.clone(),
			status: MigrationStatus::PendingApproval,
			description: descriptor.description.clone(),
			risk_level: descriptor.risk_level,
			applied_at: None,
			execution_ms: None,
			applied_by: None,
			failure: None,
			execution_id: None,
		}
	}
}

/// Role-scoped sign-off. Identity is `(version, approver_role)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRecord {
	pub version: Version,
	pub approver_role: Role,
	pub approver_name: String,
	pub approved_at: DateTime<Utc>,
	pub comments: String,
}

/// One execution attempt, keyed by its id so retried writes stay single.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionEntry {
	pub execution_id: Uuid,
	pub version: Version,
	pub status: MigrationStatus,
	pub exit_code: Option<i32>,
	pub failure: Option<FailureReason>,
	pub duration_ms: u64,
	pub executed_by: String,
	pub executed_at: DateTime<Utc>,
	pub forced: bool,
	pub stdout: String,
	pub stderr: String,
}

/// A `PENDING_APPROVAL` record joined with its approval count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingApproval {
	pub version: Version,
	pub description: String,
	pub risk_level: RiskLevel,
	pub approval_count: usize,
}

/// Aggregate counts over every record of an environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySummary {
	pub total: usize,
	pub applied: usize,
	pub rolled_back: usize,
	pub failed: usize,
	/// Latest `applied_at` of any record, whatever its status.
	pub last_applied_at: Option<DateTime<Utc>>,
}

impl HistorySummary {
	/// Builds the summary from a full scan of records.
	pub fn from_records<'a>(records: impl IntoIterator<Item = &'a MigrationRecord>) -> Self {
		let mut summary = HistorySummary::default();
		for record in records {
			summary.total += 1;
			if record.applied_at > summary.last_applied_at {
				summary.last_applied_at = record.applied_at;
			}
			match record.status {
				MigrationStatus::Applied => summary.applied += 1,
				MigrationStatus::RolledBack => summary.rolled_back += 1,
				MigrationStatus::Failed => summary.failed += 1,
				MigrationStatus::PendingApproval => {}
			}
		}
		summary
	}
}

#[cfg(test)]
mod tests {
	use chrono::TimeZone;

	use super::*;

	fn record(version: &str, status: MigrationStatus, day: u32) -> MigrationRecord {
		let mut record = MigrationRecord::pending(&MigrationDescriptor::new(version));
		record.status = status;
		record.applied_at = Some(Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap());
		record
	}

	#[test]
	fn test_summary_counts() {
		let records = vec![
			record("a", MigrationStatus::Applied, 1),
			record("b", MigrationStatus::Applied, 3),
			record("c", MigrationStatus::Failed, 4),
			record("d", MigrationStatus::RolledBack, 2),
			MigrationRecord::pending(&MigrationDescriptor::new("e")),
		];

		let summary = HistorySummary::from_records(&records);
		assert_eq!(summary.total, 5);
		assert_eq!(summary.applied, 2);
		assert_eq!(summary.failed, 1);
		assert_eq!(summary.rolled_back, 1);
		assert_eq!(summary.last_applied_at, Some(Utc.with_ymd_and_hms(2024, 1, 4, 0, 0, 0).unwrap()));
	}

	#[test]
	fn test_summary_last_applied_includes_failures() {
		let records = vec![record("a", MigrationStatus::Applied, 1), record("b", MigrationStatus::RolledBack, 9)];
		let summary = HistorySummary::from_records(&records);
		assert_eq!(summary.last_applied_at, Some(Utc.with_ymd_and_hms(2024, 1, 9, 0, 0, 0).unwrap()));

		assert_eq!(HistorySummary::from_records(&Vec::<MigrationRecord>::new()).last_applied_at, None);
	}

	#[test]
	fn test_failure_reason_parse() {
		assert_eq!("EXECUTION_TIMEOUT".parse::<FailureReason>().unwrap(), FailureReason::ExecutionTimeout);
		assert!("TIMEOUT".parse::<FailureReason>().is_err());
	}
}
