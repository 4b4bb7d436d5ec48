// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use serde::Serialize;
use sluice_core::model::{
	ApprovalRecord, ExecutionEntry, HistorySummary, MigrationDescriptor, MigrationRecord, PendingApproval,
};
use sluice_type::error::Diagnostic;

use crate::workflow::{Evaluation, MigrationState};

/// Dashboard view of one environment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
	pub environment: String,
	pub history: HistoryStatus,
}

impl StatusReport {
	pub fn is_connected(&self) -> bool {
		matches!(self.history, HistoryStatus::Connected { .. })
	}
}

/// An unreachable store degrades the report instead of failing it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "connection")]
pub enum HistoryStatus {
	Connected {
		summary: HistorySummary,
		recent: Vec<MigrationRecord>,
		pending_approvals: Vec<PendingApproval>,
	},
	Unavailable {
		diagnostic: Diagnostic,
	},
}

/// A catalog migration not yet applied, with its derived state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingMigration {
	pub descriptor: MigrationDescriptor,
	pub state: MigrationState,
	pub approvals: usize,
	pub required: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationDetail {
	pub environment: String,
	pub descriptor: MigrationDescriptor,
	pub evaluation: Evaluation,
	pub approvals: Vec<ApprovalRecord>,
	pub executions: Vec<ExecutionEntry>,
}

impl MigrationDetail {
	pub fn state(&self) -> MigrationState {
		self.evaluation.state
	}

	pub fn record(&self) -> Option<&MigrationRecord> {
		self.evaluation.record.as_ref()
	}
}
