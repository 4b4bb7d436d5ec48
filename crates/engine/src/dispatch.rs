// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Execution dispatcher.
//!
//! Gate, connect, evaluate, lock, run, record, notify. Every check happens
//! before the runner is invoked, and the runner is invoked at most once per
//! call. The outcome is recorded with a fresh execution id so retried writes
//! stay single.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use serde::Serialize;
use sluice_catalog::{CatalogError, MigrationCatalog};
use sluice_core::{
	interface::{HistoryConnector, HistoryStore, Notifier, RunExit, RunOutput, Runner, RunnerInvocation},
	model::{Actor, Capability, ExecutionEntry, FailureReason, MigrationDescriptor, MigrationRecord},
};
use sluice_policy::{PolicyError, require};
use sluice_type::{Error, MigrationStatus, Result, Version};
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::{
	error::ExecuteError,
	lock::ExecutionLocks,
	workflow::{ApprovalWorkflow, ExecutionDecision},
};

/// Captured output kept per execution entry.
pub const MAX_CAPTURED_OUTPUT: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSettings {
	pub timeout: Duration,
	pub record_write_attempts: usize,
	pub chat_channel: String,
	pub email_recipients: Vec<String>,
}

/// Outcome of one runner invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
	pub execution_id: Uuid,
	pub environment: String,
	pub version: Version,
	pub status: MigrationStatus,
	pub exit_code: Option<i32>,
	pub failure: Option<FailureReason>,
	pub duration_ms: u64,
	pub timeout_secs: u64,
	pub forced: bool,
	/// Ran only because `force` and the override capability bypassed the
	/// approval threshold.
	pub overridden: bool,
	pub stdout: String,
	pub stderr: String,
	/// False when every attempt to record the outcome failed. The migration
	/// still ran.
	pub record_written: bool,
}

impl ExecutionReport {
	pub fn succeeded(&self) -> bool {
		self.status == MigrationStatus::Applied
	}

	/// The diagnostic of a failed run.
	pub fn error(&self) -> Option<Error> {
		match self.failure? {
			FailureReason::ExecutionTimeout => Some(
				ExecuteError::Timeout {
					version: self.version.to_string(),
					timeout_secs: self.timeout_secs,
				}
				.into(),
			),
			FailureReason::ExecutionFailed => Some(
				ExecuteError::Failed {
					version: self.version.to_string(),
					exit_code: self.exit_code,
					stderr: self.stderr.clone(),
				}
				.into(),
			),
		}
	}
}

pub struct ExecutionDispatcher {
	catalog: MigrationCatalog,
	connector: Arc<dyn HistoryConnector>,
	workflow: ApprovalWorkflow,
	runner: Arc<dyn Runner>,
	notifier: Arc<dyn Notifier>,
	locks: ExecutionLocks,
	settings: DispatchSettings,
}

impl ExecutionDispatcher {
	pub fn new(
		catalog: MigrationCatalog,
		connector: Arc<dyn HistoryConnector>,
		workflow: ApprovalWorkflow,
		runner: Arc<dyn Runner>,
		notifier: Arc<dyn Notifier>,
		settings: DispatchSettings,
	) -> Self {
		Self {
			catalog,
			connector,
			workflow,
			runner,
			notifier,
			locks: ExecutionLocks::new(),
			settings,
		}
	}

	#[instrument(name = "engine::dispatch::execute", level = "info", skip(self, actor), fields(username = %actor.username))]
	pub fn execute(&self, actor: &Actor, environment: &str, version: &Version, force: bool) -> Result<ExecutionReport> {
		require(actor, Capability::Execute)?;

		let store = self.connector.connect(environment)?;

		let descriptor = self.catalog.find(version)?.ok_or_else(|| CatalogError::NotFound {
			version: version.to_string(),
		})?;

		let overridden = match self.workflow.is_execution_allowed(store.as_ref(), &descriptor, actor, force)? {
			ExecutionDecision::Allowed {
				state,
				overridden,
			} => {
				debug!(state = %state, overridden, "execution allowed");
				overridden
			}
			ExecutionDecision::Denied(reason) => {
				info!(reason = %reason, "execution denied");
				return Err(reason.into());
			}
		};

		let guard = self.locks.try_acquire(version, environment).ok_or_else(|| ExecuteError::InProgress {
			version: version.to_string(),
			environment: environment.to_string(),
		})?;

		// a concurrent execution may have finished between evaluation and lock
		if let Some(record) = store.find_record(version)? {
			if record.status == MigrationStatus::Applied {
				return Err(PolicyError::AlreadyApplied {
					version: version.to_string(),
					environment: environment.to_string(),
				}
				.into());
			}
		}

		let invocation = RunnerInvocation {
			environment: environment.to_string(),
			version: version.clone(),
			force,
		};

		let executed_at = Utc::now();
		let output = self.runner.run(&invocation, self.settings.timeout).inspect_err(|e| {
			error!(code = %e.code, message = %e.message, "runner did not start");
		})?;

		let (entry, record) = outcome(Uuid::now_v7(), &descriptor, actor, force, executed_at, &output);
		info!(execution_id = %entry.execution_id, status = %entry.status, exit_code = ?entry.exit_code, duration_ms = entry.duration_ms, "migration executed");

		let record_written = self.record_with_retry(store, environment, &entry, &record);
		drop(guard);

		let report = ExecutionReport {
			execution_id: entry.execution_id,
			environment: environment.to_string(),
			version: version.clone(),
			status: entry.status,
			exit_code: entry.exit_code,
			failure: entry.failure,
			duration_ms: entry.duration_ms,
			timeout_secs: self.settings.timeout.as_secs(),
			forced: force,
			overridden,
			stdout: output.stdout,
			stderr: output.stderr,
			record_written,
		};

		self.notify(&report, actor);
		Ok(report)
	}

	/// Writes the outcome, reconnecting after a failed attempt. Writes are
	/// idempotent on the execution id.
	fn record_with_retry(
		&self,
		store: Box<dyn HistoryStore>,
		environment: &str,
		entry: &ExecutionEntry,
		record: &MigrationRecord,
	) -> bool {
		let attempts = self.settings.record_write_attempts.max(1);
		let mut store = Some(store);

		for attempt in 1..=attempts {
			let current = match store.take() {
				Some(store) => store,
				None => match self.connector.connect(environment) {
					Ok(store) => store,
					Err(e) => {
						error!(attempt, attempts, code = %e.code, message = %e.message, "reconnect failed");
						continue;
					}
				},
			};

			match current.record_execution(entry, record) {
				Ok(()) => {
					debug!(attempt, "execution recorded");
					return true;
				}
				Err(e) => {
					error!(attempt, attempts, code = %e.code, message = %e.message, "failed to record execution");
				}
			}
		}

		error!(execution_id = %entry.execution_id, attempts, "execution outcome not recorded");
		false
	}

	fn notify(&self, report: &ExecutionReport, actor: &Actor) {
		let channel = &self.settings.chat_channel;

		if report.succeeded() {
			let mut message = format!(
				"Migration {} executed in {} by {}",
				report.version, report.environment, actor.username
			);
			if report.overridden {
				message.push_str(" (emergency override)");
			}
			if let Err(e) = self.notifier.notify_chat(&message, channel) {
				error!(code = %e.code, message = %e.message, "chat notification failed");
			}
			return;
		}

		let reason = report.failure.map(|f| f.as_str()).unwrap_or("UNKNOWN");
		let message = format!("Migration {} failed in {}: {}", report.version, report.environment, reason);
		if let Err(e) = self.notifier.notify_chat(&message, channel) {
			error!(code = %e.code, message = %e.message, "chat notification failed");
		}

		if self.settings.email_recipients.is_empty() {
			return;
		}

		let subject = format!("Migration {} failed in {}", report.version, report.environment);
		let body = format!(
			"Execution {} by {} failed with {} (exit code {:?}) after {} ms.\n\nstderr:\n{}",
			report.execution_id, actor.username, reason, report.exit_code, report.duration_ms, report.stderr
		);
		if let Err(e) = self.notifier.notify_email(&self.settings.email_recipients, &subject, &body) {
			error!(code = %e.code, message = %e.message, "email notification failed");
		}
	}
}

fn outcome(
	execution_id: Uuid,
	descriptor: &MigrationDescriptor,
	actor: &Actor,
	forced: bool,
	executed_at: chrono::DateTime<Utc>,
	output: &RunOutput,
) -> (ExecutionEntry, MigrationRecord) {
	let (status, failure) = match output.exit {
		RunExit::Exited(Some(0)) => (MigrationStatus::Applied, None),
		RunExit::TimedOut => (MigrationStatus::Failed, Some(FailureReason::ExecutionTimeout)),
		RunExit::Exited(_) => (MigrationStatus::Failed, Some(FailureReason::ExecutionFailed)),
	};
	let duration_ms = output.duration.as_millis().min(u64::MAX as u128) as u64;

	let entry = ExecutionEntry {
		execution_id,
		version: descriptor.version.clone(),
		status,
		exit_code: output.exit_code(),
		failure,
		duration_ms,
		executed_by: actor.username.clone(),
		executed_at,
		forced,
		stdout: truncate(&output.stdout),
		stderr: truncate(&output.stderr),
	};

	let record = MigrationRecord {
		version: descriptor.version.clone(),
		status,
		description: descriptor.description.clone(),
		risk_level: descriptor.risk_level,
		applied_at: Some(executed_at),
		execution_ms: Some(duration_ms),
		applied_by: Some(actor.username.clone()),
		failure,
		execution_id: Some(execution_id),
	};

	(entry, record)
}

fn truncate(output: &str) -> String {
	if output.len() <= MAX_CAPTURED_OUTPUT {
		return output.to_string();
	}

	let mut end = MAX_CAPTURED_OUTPUT;
	while !output.is_char_boundary(end) {
		end -= 1;
	}
	format!("{}\n[truncated {} bytes]", &output[..end], output.len() - end)
}
