// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! SQLite history store.
//!
//! One connection is opened per [`SqliteConnector::open`] call and closed when
//! the returned [`SqliteHistory`] is dropped.

mod config;
mod connection;

use std::{
	collections::{BTreeSet, HashMap},
	str::FromStr,
};

use chrono::{DateTime, SecondsFormat, Utc};
pub use config::{DbPath, JournalMode, OpenFlags, SqliteConfig, SynchronousMode};
use connection::{connect, map_error};
use rusqlite::{Connection, OptionalExtension, Row, params};
use sluice_core::{
	interface::{HistoryConnector, HistoryStore},
	model::{ApprovalRecord, ExecutionEntry, FailureReason, HistorySummary, MigrationRecord, PendingApproval, Role},
};
use sluice_type::{Error, MigrationStatus, RiskLevel, Version};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::{Result, backend::check_transition, error::StoreError};

const RECORD_COLUMNS: &str =
	"version, status, description, risk_level, applied_at, execution_ms, applied_by, failure, execution_id";

const EXECUTION_COLUMNS: &str = "execution_id, version, status, exit_code, failure, duration_ms, executed_by, \
	 executed_at, forced, stdout, stderr";

pub struct SqliteHistory {
	environment: String,
	conn: Connection,
}

impl SqliteHistory {
	fn err(&self, operation: &'static str) -> impl Fn(rusqlite::Error) -> Error + '_ {
		move |e| map_error(&self.environment, operation, e)
	}

	fn current_status(&self, version: &Version) -> Result<Option<MigrationStatus>> {
		let status: Option<String> = self
			.conn
			.query_row("SELECT status FROM migration_history WHERE version = ?1", [version.as_str()], |row| {
				row.get(0)
			})
			.optional()
			.map_err(self.err("find_record"))?;

		status.map(|s| decode::<MigrationStatus>("status", &s)).transpose()
	}

	fn upsert_record(conn: &Connection, record: &MigrationRecord) -> rusqlite::Result<usize> {
		conn.execute(
			"INSERT INTO migration_history (version, status, description, risk_level, applied_at, execution_ms, \
			 applied_by, failure, execution_id)
			 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
			 ON CONFLICT (version) DO UPDATE SET
				status = excluded.status,
				description = excluded.description,
				risk_level = excluded.risk_level,
				applied_at = excluded.applied_at,
				execution_ms = excluded.execution_ms,
				applied_by = excluded.applied_by,
				failure = excluded.failure,
				execution_id = excluded.execution_id",
			params![
				record.version.as_str(),
				record.status.as_str(),
				record.description,
				record.risk_level.as_str(),
				record.applied_at.map(timestamp),
				record.execution_ms.map(|ms| ms as i64),
				record.applied_by,
				record.failure.map(|f| f.as_str()),
				record.execution_id.map(|id| id.to_string()),
			],
		)
	}

	fn query_records(&self, sql: &str, operation: &'static str) -> Result<Vec<MigrationRecord>> {
		let mut stmt = self.conn.prepare(sql).map_err(self.err(operation))?;
		let rows = stmt.query_map([], RawRecord::from_row).map_err(self.err(operation))?;

		let mut result = Vec::new();
		for row in rows {
			result.push(row.map_err(self.err(operation))?.decode()?);
		}
		Ok(result)
	}
}

impl HistoryStore for SqliteHistory {
	fn environment(&self) -> &str {
		&self.environment
	}

	#[instrument(name = "store::sqlite::summarize", level = "debug", skip(self), fields(environment = %self.environment))]
	fn summarize(&self) -> Result<HistorySummary> {
		let records = self.query_records(&format!("SELECT {} FROM migration_history", RECORD_COLUMNS), "summarize")?;
		Ok(HistorySummary::from_records(&records))
	}

	#[instrument(name = "store::sqlite::recent_records", level = "debug", skip(self), fields(environment = %self.environment))]
	fn recent_records(&self, limit: usize) -> Result<Vec<MigrationRecord>> {
		self.query_records(
			&format!(
				"SELECT {} FROM migration_history ORDER BY applied_at IS NULL, applied_at DESC, version ASC LIMIT {}",
				RECORD_COLUMNS,
				limit.min(i64::MAX as usize)
			),
			"recent_records",
		)
	}

	#[instrument(name = "store::sqlite::pending_approvals", level = "debug", skip(self), fields(environment = %self.environment))]
	fn pending_approvals(&self) -> Result<Vec<PendingApproval>> {
		let mut stmt = self
			.conn
			.prepare(
				"SELECT h.version, h.description, h.risk_level, COUNT(a.approver_role)
				 FROM migration_history h
				 LEFT JOIN migration_approvals a ON a.version = h.version
				 WHERE h.status = ?1
				 GROUP BY h.version, h.description, h.risk_level
				 ORDER BY h.version",
			)
			.map_err(self.err("pending_approvals"))?;

		let rows = stmt
			.query_map([MigrationStatus::PendingApproval.as_str()], |row| {
				Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?, row.get::<_, i64>(3)?))
			})
			.map_err(self.err("pending_approvals"))?;

		let mut result = Vec::new();
		for row in rows {
			let (version, description, risk_level, count) = row.map_err(self.err("pending_approvals"))?;
			result.push(PendingApproval {
				version: Version::new(version),
				description,
				risk_level: decode::<RiskLevel>("risk_level", &risk_level)?,
				approval_count: count as usize,
			});
		}
		Ok(result)
	}

	#[instrument(name = "store::sqlite::applied_versions", level = "debug", skip(self), fields(environment = %self.environment))]
	fn applied_versions(&self) -> Result<BTreeSet<Version>> {
		let mut stmt = self
			.conn
			.prepare("SELECT version FROM migration_history WHERE status = ?1")
			.map_err(self.err("applied_versions"))?;

		let rows = stmt
			.query_map([MigrationStatus::Applied.as_str()], |row| row.get::<_, String>(0))
			.map_err(self.err("applied_versions"))?;

		let mut result = BTreeSet::new();
		for row in rows {
			result.insert(Version::new(row.map_err(self.err("applied_versions"))?));
		}
		Ok(result)
	}

	fn find_record(&self, version: &Version) -> Result<Option<MigrationRecord>> {
		let raw = self
			.conn
			.query_row(
				&format!("SELECT {} FROM migration_history WHERE version = ?1", RECORD_COLUMNS),
				[version.as_str()],
				RawRecord::from_row,
			)
			.optional()
			.map_err(self.err("find_record"))?;

		raw.map(RawRecord::decode).transpose()
	}

	#[instrument(name = "store::sqlite::write_record", level = "debug", skip(self, record), fields(version = %record.version, status = %record.status))]
	fn write_record(&self, record: &MigrationRecord) -> Result<()> {
		let tx = self.conn.unchecked_transaction().map_err(self.err("write_record"))?;
		check_transition(self.current_status(&record.version)?, record)?;
		Self::upsert_record(&tx, record).map_err(self.err("write_record"))?;
		tx.commit().map_err(self.err("write_record"))
	}

	fn approvals(&self, version: &Version) -> Result<Vec<ApprovalRecord>> {
		let mut stmt = self
			.conn
			.prepare(
				"SELECT approver_role, approver_name, approved_at, comments
				 FROM migration_approvals WHERE version = ?1 ORDER BY approved_at, approver_role",
			)
			.map_err(self.err("approvals"))?;

		let rows = stmt
			.query_map([version.as_str()], |row| {
				Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?, row.get::<_, String>(3)?))
			})
			.map_err(self.err("approvals"))?;

		let mut result = Vec::new();
		for row in rows {
			let (role, name, approved_at, comments) = row.map_err(self.err("approvals"))?;
			result.push(ApprovalRecord {
				version: version.clone(),
				approver_role: Role::from(role),
				approver_name: name,
				approved_at: parse_timestamp(&approved_at)?,
				comments,
			});
		}
		Ok(result)
	}

	fn approval_count(&self, version: &Version) -> Result<usize> {
		let count: i64 = self
			.conn
			.query_row("SELECT COUNT(*) FROM migration_approvals WHERE version = ?1", [version.as_str()], |row| {
				row.get(0)
			})
			.map_err(self.err("approval_count"))?;
		Ok(count as usize)
	}

	#[instrument(name = "store::sqlite::upsert_approval", level = "debug", skip(self, approval), fields(version = %approval.version, role = %approval.approver_role))]
	fn upsert_approval(&self, approval: &ApprovalRecord) -> Result<()> {
		self.conn
			.execute(
				"INSERT INTO migration_approvals (version, approver_role, approver_name, approved_at, comments)
				 VALUES (?1, ?2, ?3, ?4, ?5)
				 ON CONFLICT (version, approver_role) DO UPDATE SET
					approver_name = excluded.approver_name,
					approved_at = excluded.approved_at,
					comments = excluded.comments",
				params![
					approval.version.as_str(),
					approval.approver_role.as_str(),
					approval.approver_name,
					timestamp(approval.approved_at),
					approval.comments,
				],
			)
			.map_err(self.err("upsert_approval"))?;
		Ok(())
	}

	#[instrument(name = "store::sqlite::record_execution", level = "debug", skip(self, entry, record), fields(execution_id = %entry.execution_id))]
	fn record_execution(&self, entry: &ExecutionEntry, record: &MigrationRecord) -> Result<()> {
		let tx = self.conn.unchecked_transaction().map_err(self.err("record_execution"))?;

		let exists: Option<i64> = tx
			.query_row(
				"SELECT 1 FROM migration_executions WHERE execution_id = ?1",
				[entry.execution_id.to_string()],
				|row| row.get(0),
			)
			.optional()
			.map_err(self.err("record_execution"))?;
		if exists.is_some() {
			debug!("execution already recorded");
			return Ok(());
		}

		check_transition(self.current_status(&record.version)?, record)?;

		tx.execute(
			&format!(
				"INSERT INTO migration_executions ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
				EXECUTION_COLUMNS
			),
			params![
				entry.execution_id.to_string(),
				entry.version.as_str(),
				entry.status.as_str(),
				entry.exit_code,
				entry.failure.map(|f| f.as_str()),
				entry.duration_ms as i64,
				entry.executed_by,
				timestamp(entry.executed_at),
				entry.forced,
				entry.stdout,
				entry.stderr,
			],
		)
		.map_err(self.err("record_execution"))?;
		Self::upsert_record(&tx, record).map_err(self.err("record_execution"))?;

		tx.commit().map_err(self.err("record_execution"))
	}

	fn executions(&self, version: &Version) -> Result<Vec<ExecutionEntry>> {
		let mut stmt = self
			.conn
			.prepare(&format!(
				"SELECT {} FROM migration_executions WHERE version = ?1 ORDER BY executed_at, execution_id",
				EXECUTION_COLUMNS
			))
			.map_err(self.err("executions"))?;

		let rows = stmt.query_map([version.as_str()], RawExecution::from_row).map_err(self.err("executions"))?;

		let mut result = Vec::new();
		for row in rows {
			result.push(row.map_err(self.err("executions"))?.decode()?);
		}
		Ok(result)
	}
}

/// Maps environment names to database configurations.
pub struct SqliteConnector {
	configs: HashMap<String, SqliteConfig>,
}

impl SqliteConnector {
	pub fn new<I, S>(environments: I) -> Self
	where
		I: IntoIterator<Item = (S, SqliteConfig)>,
		S: Into<String>,
	{
		Self {
			configs: environments.into_iter().map(|(name, config)| (name.into(), config)).collect(),
		}
	}

	#[instrument(name = "store::sqlite::open", level = "debug", skip(self))]
	pub fn open(&self, environment: &str) -> Result<SqliteHistory> {
		let config = self.configs.get(environment).ok_or_else(|| StoreError::UnknownEnvironment {
			environment: environment.to_string(),
		})?;

		Ok(SqliteHistory {
			environment: environment.to_string(),
			conn: connect(environment, config)?,
		})
	}
}

impl HistoryConnector for SqliteConnector {
	fn connect(&self, environment: &str) -> Result<Box<dyn HistoryStore>> {
		Ok(Box::new(self.open(environment)?))
	}
}

impl Drop for SqliteConnector {
	fn drop(&mut self) {
		for config in self.configs.values() {
			if let DbPath::Tmpfs(path) = &config.path {
				let _ = std::fs::remove_file(path);
				let _ = std::fs::remove_file(format!("{}-wal", path.display()));
				let _ = std::fs::remove_file(format!("{}-shm", path.display()));
				let _ = std::fs::remove_file(format!("{}-journal", path.display()));
			}
		}
	}
}

fn timestamp(at: DateTime<Utc>) -> String {
	at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
	DateTime::parse_from_rfc3339(value)
		.map(|at| at.with_timezone(&Utc))
		.map_err(|e| StoreError::query("decode", format!("timestamp '{}': {}", value, e)).into())
}

fn decode<T>(column: &str, value: &str) -> Result<T>
where
	T: FromStr,
	T::Err: std::fmt::Display,
{
	value.parse::<T>().map_err(|e| StoreError::query("decode", format!("{}: {}", column, e)).into())
}

struct RawRecord {
	version: String,
	status: String,
	description: String,
	risk_level: String,
	applied_at: Option<String>,
	execution_ms: Option<i64>,
	applied_by: Option<String>,
	failure: Option<String>,
	execution_id: Option<String>,
}

impl RawRecord {
	fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
		Ok(Self {
			version: row.get(0)?,
			status: row.get(1)?,
			description: row.get(2)?,
			risk_level: row.get(3)?,
			applied_at: row.get(4)?,
			execution_ms: row.get(5)?,
			applied_by: row.get(6)?,
			failure: row.get(7)?,
			execution_id: row.get(8)?,
		})
	}

	fn decode(self) -> Result<MigrationRecord> {
		Ok(MigrationRecord {
			version: Version::new(self.version),
			status: decode("status", &self.status)?,
			description: self.description,
			risk_level: decode("risk_level", &self.risk_level)?,
			applied_at: self.applied_at.as_deref().map(parse_timestamp).transpose()?,
			execution_ms: self.execution_ms.map(|ms| ms as u64),
			applied_by: self.applied_by,
			failure: self.failure.as_deref().map(|f| decode::<FailureReason>("failure", f)).transpose()?,
			execution_id: self.execution_id.as_deref().map(|id| decode::<Uuid>("execution_id", id)).transpose()?,
		})
	}
}

struct RawExecution {
	execution_id: String,
	version: String,
	status: String,
	exit_code: Option<i32>,
	failure: Option<String>,
	duration_ms: i64,
	executed_by: String,
	executed_at: String,
	forced: bool,
	stdout: String,
	stderr: String,
}

impl RawExecution {
	fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
		Ok(Self {
			execution_id: row.get(0)?,
			version: row.get(1)?,
			status: row.get(2)?,
			exit_code: row.get(3)?,
			failure: row.get(4)?,
			duration_ms: row.get(5)?,
			executed_by: row.get(6)?,
			executed_at: row.get(7)?,
			forced: row.get(8)?,
			stdout: row.get(9)?,
			stderr: row.get(10)?,
		})
	}

	fn decode(self) -> Result<ExecutionEntry> {
		Ok(ExecutionEntry {
			execution_id: decode("execution_id", &self.execution_id)?,
			version: Version::new(self.version),
			status: decode("status", &self.status)?,
			exit_code: self.exit_code,
			failure: self.failure.as_deref().map(|f| decode::<FailureReason>("failure", f)).transpose()?,
			duration_ms: self.duration_ms as u64,
			executed_by: self.executed_by,
			executed_at: parse_timestamp(&self.executed_at)?,
			forced: self.forced,
			stdout: self.stdout,
			stderr: self.stderr,
		})
	}
}

#[cfg(test)]
mod tests {
	use chrono::TimeZone;
	use sluice_core::model::MigrationDescriptor;

	use super::*;

	fn connector() -> SqliteConnector {
		SqliteConnector::new([("staging", SqliteConfig::in_memory()), ("production", SqliteConfig::in_memory())])
	}

	fn descriptor(version: &str, risk: RiskLevel) -> MigrationDescriptor {
		let mut d = MigrationDescriptor::new(version);
		d.description = format!("migration {}", version);
		d.risk_level = risk;
		d
	}

	fn at(day: u32) -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2024, 3, day, 12, 30, 0).unwrap()
	}

	fn applied(version: &str, day: u32) -> MigrationRecord {
		let mut record = MigrationRecord::pending(&descriptor(version, RiskLevel::Medium));
		record.status = MigrationStatus::Applied;
		record.applied_at = Some(at(day));
		record.execution_ms = Some(1200);
		record.applied_by = Some("dana".to_string());
		record
	}

	fn approval(version: &str, role: Role, comments: &str) -> ApprovalRecord {
		ApprovalRecord {
			version: Version::from(version),
			approver_role: role,
			approver_name: "alice".to_string(),
			approved_at: at(1),
			comments: comments.to_string(),
		}
	}

	fn failed_execution(version: &str) -> (ExecutionEntry, MigrationRecord) {
		let entry = ExecutionEntry {
			execution_id: Uuid::now_v7(),
			version: Version::from(version),
			status: MigrationStatus::Failed,
			exit_code: None,
			failure: Some(FailureReason::ExecutionTimeout),
			duration_ms: 300_000,
			executed_by: "dana".to_string(),
			executed_at: at(4),
			forced: true,
			stdout: "starting".to_string(),
			stderr: String::new(),
		};

		let mut record = MigrationRecord::pending(&descriptor(version, RiskLevel::High));
		record.status = MigrationStatus::Failed;
		record.failure = Some(FailureReason::ExecutionTimeout);
		record.applied_at = Some(at(4));
		record.execution_id = Some(entry.execution_id);
		(entry, record)
	}

	#[test]
	fn test_record_survives_reconnect() {
		let connector = connector();
		connector.open("staging").unwrap().write_record(&applied("v1", 2)).unwrap();

		let record = connector.open("staging").unwrap().find_record(&Version::from("v1")).unwrap().unwrap();
		assert_eq!(record, applied("v1", 2));
	}

	#[test]
	fn test_environments_are_isolated() {
		let connector = connector();
		connector.open("staging").unwrap().write_record(&applied("v1", 2)).unwrap();

		assert!(connector.open("production").unwrap().applied_versions().unwrap().is_empty());
		assert_eq!(connector.open("staging").unwrap().applied_versions().unwrap().len(), 1);
	}

	#[test]
	fn test_unknown_environment() {
		let err = connector().open("qa").err().unwrap();
		assert_eq!(err.code(), "CONFIG_001");
	}

	#[test]
	fn test_pending_approvals_join() {
		let store = connector().open("staging").unwrap();
		store.write_record(&MigrationRecord::pending(&descriptor("v2", RiskLevel::High))).unwrap();
		store.write_record(&MigrationRecord::pending(&descriptor("v1", RiskLevel::Low))).unwrap();
		store.write_record(&applied("v0", 1)).unwrap();
		store.upsert_approval(&approval("v2", Role::DataOpsLead, "ok")).unwrap();
		store.upsert_approval(&approval("v2", Role::Dba, "ok")).unwrap();

		let pending = store.pending_approvals().unwrap();
		assert_eq!(pending.len(), 2);
		assert_eq!(pending[0].version.as_str(), "v1");
		assert_eq!(pending[0].approval_count, 0);
		assert_eq!(pending[1].version.as_str(), "v2");
		assert_eq!(pending[1].risk_level, RiskLevel::High);
		assert_eq!(pending[1].approval_count, 2);
	}

	#[test]
	fn test_approval_upsert_replaces_per_role() {
		let store = connector().open("staging").unwrap();
		store.upsert_approval(&approval("v1", Role::DataOpsLead, "looks fine")).unwrap();
		store.upsert_approval(&approval("v1", Role::DataOpsLead, "verified on replica")).unwrap();

		let approvals = store.approvals(&Version::from("v1")).unwrap();
		assert_eq!(approvals.len(), 1);
		assert_eq!(approvals[0].comments, "verified on replica");
		assert_eq!(store.approval_count(&Version::from("v1")).unwrap(), 1);
	}

	#[test]
	fn test_recent_records_order_and_summary() {
		let store = connector().open("staging").unwrap();
		store.write_record(&applied("v1", 1)).unwrap();
		store.write_record(&applied("v2", 5)).unwrap();
		store.write_record(&MigrationRecord::pending(&descriptor("v3", RiskLevel::Low))).unwrap();
		let (entry, record) = failed_execution("v4");
		store.record_execution(&entry, &record).unwrap();

		let recent: Vec<String> =
			store.recent_records(10).unwrap().into_iter().map(|r| r.version.to_string()).collect();
		assert_eq!(recent, vec!["v2", "v4", "v1", "v3"]);

		let summary = store.summarize().unwrap();
		assert_eq!(summary.total, 4);
		assert_eq!(summary.applied, 2);
		assert_eq!(summary.failed, 1);
		assert_eq!(summary.last_applied_at, Some(at(5)));
	}

	#[test]
	fn test_record_execution_once() {
		let store = connector().open("staging").unwrap();
		let (entry, record) = failed_execution("v1");

		store.record_execution(&entry, &record).unwrap();
		store.record_execution(&entry, &record).unwrap();

		let executions = store.executions(&Version::from("v1")).unwrap();
		assert_eq!(executions, vec![entry]);

		let stored = store.find_record(&Version::from("v1")).unwrap().unwrap();
		assert_eq!(stored.failure, Some(FailureReason::ExecutionTimeout));
		assert_eq!(stored.execution_id, record.execution_id);
	}

	#[test]
	fn test_rejected_transition_writes_nothing() {
		let store = connector().open("staging").unwrap();
		store.write_record(&applied("v1", 1)).unwrap();

		let (entry, record) = failed_execution("v1");
		let err = store.record_execution(&entry, &record).unwrap_err();
		assert_eq!(err.code(), "STORE_002");
		assert!(store.executions(&Version::from("v1")).unwrap().is_empty());
		assert_eq!(store.find_record(&Version::from("v1")).unwrap().unwrap().status, MigrationStatus::Applied);
	}
}
