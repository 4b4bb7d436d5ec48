// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Approval state machine.
//!
//! The state of a migration in an environment is derived on every call from
//! its ledger record and approval count; nothing here is cached.

use std::{
	fmt::{Display, Formatter},
	sync::Arc,
};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sluice_core::{
	interface::HistoryStore,
	model::{Actor, ApprovalRecord, Capability, MigrationDescriptor, MigrationRecord, Role},
};
use sluice_policy::{ApprovalPolicy, PolicyError, has_capability};
use sluice_type::{MigrationStatus, Version};
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MigrationState {
	UnknownNotYetRun,
	PendingApproval,
	ApprovedSufficient,
	Applied,
	Failed,
	RolledBack,
}

impl MigrationState {
	pub fn as_str(&self) -> &'static str {
		match self {
			MigrationState::UnknownNotYetRun => "UNKNOWN_NOT_YET_RUN",
			MigrationState::PendingApproval => "PENDING_APPROVAL",
			MigrationState::ApprovedSufficient => "APPROVED_SUFFICIENT",
			MigrationState::Applied => "APPLIED",
			MigrationState::Failed => "FAILED",
			MigrationState::RolledBack => "ROLLED_BACK",
		}
	}
}

impl Display for MigrationState {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Derives the state from the ledger.
pub fn classify(record: Option<&MigrationRecord>, approvals: usize, required: usize) -> MigrationState {
	match record.map(|r| r.status) {
		Some(MigrationStatus::Applied) => return MigrationState::Applied,
		Some(MigrationStatus::RolledBack) => return MigrationState::RolledBack,
		Some(MigrationStatus::Failed) => return MigrationState::Failed,
		Some(MigrationStatus::PendingApproval) | None => {}
	}

	if approvals >= required && (record.is_some() || required > 0) {
		return MigrationState::ApprovedSufficient;
	}

	if record.is_some() {
		MigrationState::PendingApproval
	} else {
		MigrationState::UnknownNotYetRun
	}
}

/// State of one migration plus the counts that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
	pub state: MigrationState,
	pub approvals: usize,
	pub required: usize,
	pub record: Option<MigrationRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionDecision {
	Allowed {
		state: MigrationState,
		/// Allowed only because of `force` and the override capability.
		overridden: bool,
	},
	Denied(PolicyError),
}

impl ExecutionDecision {
	pub fn is_allowed(&self) -> bool {
		matches!(self, ExecutionDecision::Allowed { .. })
	}
}

#[derive(Clone)]
pub struct ApprovalWorkflow {
	policy: Arc<dyn ApprovalPolicy>,
}

impl ApprovalWorkflow {
	pub fn new(policy: Arc<dyn ApprovalPolicy>) -> Self {
		Self {
			policy,
		}
	}

	pub fn required_approvals(&self, descriptor: &MigrationDescriptor) -> usize {
		self.policy.required_approvals(descriptor.risk_level)
	}

	#[instrument(name = "engine::workflow::evaluate", level = "debug", skip(self, store, descriptor), fields(version = %descriptor.version))]
	pub fn evaluate(&self, store: &dyn HistoryStore, descriptor: &MigrationDescriptor) -> sluice_type::Result<Evaluation> {
		let record = store.find_record(&descriptor.version)?;
		let approvals = store.approval_count(&descriptor.version)?;
		let required = self.required_approvals(descriptor);

		Ok(Evaluation {
			state: classify(record.as_ref(), approvals, required),
			approvals,
			required,
			record,
		})
	}

	/// Upserts the approval of `approver_role`, replacing an earlier one from
	/// the same role.
	#[instrument(name = "engine::workflow::record_approval", level = "debug", skip(self, store, comments))]
	pub fn record_approval(
		&self,
		store: &dyn HistoryStore,
		version: &Version,
		approver_role: &Role,
		approver_name: &str,
		comments: &str,
	) -> sluice_type::Result<ApprovalRecord> {
		let approval = ApprovalRecord {
			version: version.clone(),
			approver_role: approver_role.clone(),
			approver_name: approver_name.to_string(),
			approved_at: Utc::now(),
			comments: comments.to_string(),
		};
		store.upsert_approval(&approval)?;
		debug!("approval recorded");
		Ok(approval)
	}

	#[instrument(name = "engine::workflow::is_execution_allowed", level = "debug", skip(self, store, descriptor, requested_by), fields(version = %descriptor.version, username = %requested_by.username))]
	pub fn is_execution_allowed(
		&self,
		store: &dyn HistoryStore,
		descriptor: &MigrationDescriptor,
		requested_by: &Actor,
		force: bool,
	) -> sluice_type::Result<ExecutionDecision> {
		let evaluation = self.evaluate(store, descriptor)?;
		Ok(decide(
			&evaluation,
			descriptor,
			store.environment(),
			force && has_capability(requested_by, Capability::EmergencyDeploy),
		))
	}
}

fn decide(evaluation: &Evaluation, descriptor: &MigrationDescriptor, environment: &str, may_override: bool) -> ExecutionDecision {
	let state = evaluation.state;

	if state == MigrationState::Applied {
		return ExecutionDecision::Denied(PolicyError::AlreadyApplied {
			version: descriptor.version.to_string(),
			environment: environment.to_string(),
		});
	}

	let sufficient = evaluation.approvals >= evaluation.required;
	let allowed = match state {
		MigrationState::ApprovedSufficient => true,
		MigrationState::UnknownNotYetRun => evaluation.required == 0,
		MigrationState::Failed | MigrationState::RolledBack => sufficient,
		MigrationState::PendingApproval | MigrationState::Applied => false,
	};

	if allowed {
		return ExecutionDecision::Allowed {
			state,
			overridden: false,
		};
	}

	if may_override {
		return ExecutionDecision::Allowed {
			state,
			overridden: true,
		};
	}

	ExecutionDecision::Denied(PolicyError::InsufficientApprovals {
		version: descriptor.version.to_string(),
		risk: descriptor.risk_level,
		approvals: evaluation.approvals,
		required: evaluation.required,
	})
}
