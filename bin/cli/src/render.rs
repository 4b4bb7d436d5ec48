// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::Write;

use serde::Serialize;
use sluice_core::model::{ApprovalRecord, MigrationRecord};
use sluice_engine::{ExecutionReport, HistoryStatus, MigrationDetail, PendingMigration, StatusReport};
use sluice_type::{Result, error, internal_error};

pub(crate) struct Output {
	json: bool,
}

impl Output {
	pub(crate) fn new(json: bool) -> Self {
		Self {
			json,
		}
	}

	pub(crate) fn status(&self, report: &StatusReport) -> Result<()> {
		self.emit(report, || status_text(report))
	}

	pub(crate) fn pending(&self, environment: &str, pending: &[PendingMigration]) -> Result<()> {
		self.emit(pending, || pending_text(environment, pending))
	}

	pub(crate) fn detail(&self, detail: &MigrationDetail) -> Result<()> {
		self.emit(detail, || detail_text(detail))
	}

	pub(crate) fn approval(&self, approval: &ApprovalRecord) -> Result<()> {
		self.emit(approval, || {
			format!(
				"Approved {} as {} ({})\n",
				approval.version, approval.approver_name, approval.approver_role
			)
		})
	}

	pub(crate) fn execution(&self, report: &ExecutionReport) -> Result<()> {
		self.emit(report, || execution_text(report))
	}

	pub(crate) fn record(&self, record: &MigrationRecord) -> Result<()> {
		self.emit(record, || format!("{} is now {}\n", record.version, record.status))
	}

	fn emit<T: Serialize + ?Sized>(&self, value: &T, text: impl FnOnce() -> String) -> Result<()> {
		if self.json {
			let json = serde_json::to_string_pretty(value)
				.map_err(|e| error!(internal_error!("cannot serialize output: {}", e)))?;
			println!("{}", json);
		} else {
			print!("{}", text());
		}
		Ok(())
	}
}

fn status_text(report: &StatusReport) -> String {
	let mut out = String::new();
	let _ = writeln!(out, "Environment: {}", report.environment);

	match &report.history {
		HistoryStatus::Unavailable {
			diagnostic,
		} => {
			let _ = writeln!(out, "History store unavailable ({}): {}", diagnostic.code, diagnostic.message);
		}
		HistoryStatus::Connected {
			summary,
			recent,
			pending_approvals,
		} => {
			let _ = writeln!(
				out,
				"Migrations: {} total, {} applied, {} failed, {} rolled back",
				summary.total, summary.applied, summary.failed, summary.rolled_back
			);
			if let Some(at) = summary.last_applied_at {
				let _ = writeln!(out, "Last applied: {}", at.to_rfc3339());
			}

			if !recent.is_empty() {
				let _ = writeln!(out, "\nRecent:");
				for record in recent {
					let applied = record.applied_at.map(|at| at.to_rfc3339()).unwrap_or_else(|| "-".to_string());
					let _ = writeln!(
						out,
						"  {:<32} {:<16} {:<6} {}",
						record.version.as_str(), record.status.as_str(), record.risk_level.as_str(), applied
					);
				}
			}

			if !pending_approvals.is_empty() {
				let _ = writeln!(out, "\nAwaiting approval:");
				for pending in pending_approvals {
					let _ = writeln!(
						out,
						"  {:<32} {:<6} {} approval(s)  {}",
						pending.version.as_str(), pending.risk_level.as_str(), pending.approval_count, pending.description
					);
				}
			}
		}
	}
	out
}

fn pending_text(environment: &str, pending: &[PendingMigration]) -> String {
	let mut out = String::new();
	if pending.is_empty() {
		let _ = writeln!(out, "No pending migrations in {}", environment);
		return out;
	}

	for migration in pending {
		let d = &migration.descriptor;
		let _ = writeln!(
			out,
			"{:<32} {:<6} {:<20} {}/{}  {}",
			d.version.as_str(), d.risk_level.as_str(), migration.state.as_str(), migration.approvals, migration.required, d.description
		);
	}
	out
}

fn detail_text(detail: &MigrationDetail) -> String {
	let d = &detail.descriptor;
	let mut out = String::new();
	let _ = writeln!(out, "{} ({})", d.version, detail.environment);
	let _ = writeln!(out, "  description: {}", d.description);
	let _ = writeln!(out, "  risk:        {}", d.risk_level);
	if !d.estimated_duration.is_empty() {
		let _ = writeln!(out, "  duration:    {}", d.estimated_duration);
	}
	if !d.author.is_empty() {
		let _ = writeln!(out, "  author:      {}", d.author);
	}
	let _ = writeln!(
		out,
		"  state:       {} ({}/{} approvals)",
		detail.state(),
		detail.evaluation.approvals,
		detail.evaluation.required
	);

	for approval in &detail.approvals {
		let _ = writeln!(
			out,
			"  approved by {} ({}) at {}: {}",
			approval.approver_name,
			approval.approver_role,
			approval.approved_at.to_rfc3339(),
			approval.comments
		);
	}

	for entry in &detail.executions {
		let _ = writeln!(
			out,
			"  executed {} by {} at {}: {} in {} ms{}",
			entry.execution_id,
			entry.executed_by,
			entry.executed_at.to_rfc3339(),
			entry.status,
			entry.duration_ms,
			if entry.forced { " (forced)" } else { "" }
		);
	}
	out
}

fn execution_text(report: &ExecutionReport) -> String {
	let mut out = String::new();
	let _ = writeln!(
		out,
		"{} in {}: {} after {} ms (execution {})",
		report.version, report.environment, report.status, report.duration_ms, report.execution_id
	);
	if report.overridden {
		let _ = writeln!(out, "approval threshold bypassed by emergency override");
	}
	if !report.stdout.is_empty() {
		let _ = write!(out, "{}", report.stdout);
		if !report.stdout.ends_with('\n') {
			out.push('\n');
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use sluice_core::model::HistorySummary;
	use sluice_type::error::Diagnostic;

	use super::*;

	#[test]
	fn test_status_unavailable() {
		let report = StatusReport {
			environment: "staging".to_string(),
			history: HistoryStatus::Unavailable {
				diagnostic: Diagnostic::new("STORE_001", "connection refused"),
			},
		};
		let text = status_text(&report);
		assert!(text.contains("History store unavailable (STORE_001): connection refused"));
	}

	#[test]
	fn test_status_connected() {
		let report = StatusReport {
			environment: "staging".to_string(),
			history: HistoryStatus::Connected {
				summary: HistorySummary {
					total: 3,
					applied: 2,
					rolled_back: 0,
					failed: 1,
					last_applied_at: None,
				},
				recent: vec![],
				pending_approvals: vec![],
			},
		};
		let text = status_text(&report);
		assert!(text.contains("3 total, 2 applied, 1 failed, 0 rolled back"));
		assert!(!text.contains("Recent:"));
	}

	#[test]
	fn test_pending_empty() {
		assert_eq!(pending_text("prod", &[]), "No pending migrations in prod\n");
	}
}
