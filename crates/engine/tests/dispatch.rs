// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Runner outcomes, record writes and mutual exclusion of executions.

use std::{sync::Arc, thread, time::Duration};

use sluice_core::{
	interface::{HistoryConnector, Notifier},
	model::{EnvironmentConfig, FailureReason, Role},
};
use sluice_engine::{Sluice, SluiceConfig};
use sluice_store::MemoryConnector;
use sluice_testing::{
	catalog::{CatalogDir, migration_sql},
	notify::{FailingNotifier, RecordingNotifier},
	runner::FakeRunner,
	store::FlakyConnector,
};
use sluice_type::{MigrationStatus, RiskLevel, Version};

const ADD_USERS: &str = "2024_01_add_users";

fn catalog() -> CatalogDir {
	CatalogDir::new().with(ADD_USERS, &migration_sql("Add users table", RiskLevel::Low))
}

fn config(catalog: &CatalogDir) -> SluiceConfig {
	SluiceConfig::default()
		.with_migrations_dir(catalog.path())
		.with_environment(EnvironmentConfig::new("staging", "app_staging"))
		.with_actor("dana", Role::Dba)
		.with_email_recipients(["oncall@example.com"])
		.with_timeout(Duration::from_secs(2))
}

fn sluice(
	config: SluiceConfig,
	connector: Arc<dyn HistoryConnector>,
	runner: Arc<FakeRunner>,
	notifier: Arc<dyn Notifier>,
) -> Sluice {
	Sluice::builder(config).connector(connector).runner(runner).notifier(notifier).build().unwrap()
}

#[test]
fn test_timeout_is_recorded_once_despite_retries() {
	let catalog = catalog();
	let flaky = Arc::new(FlakyConnector::new(MemoryConnector::new(["staging"]), 2));
	let runner = Arc::new(FakeRunner::timing_out());
	let notifier = Arc::new(RecordingNotifier::new());
	let sluice = sluice(config(&catalog), flaky.clone(), runner.clone(), notifier.clone());
	let dana = sluice.resolve_actor("dana").unwrap();
	let version = Version::from(ADD_USERS);

	let report = sluice.execute_migration("staging", &dana, &version, false).unwrap();
	assert_eq!(report.status, MigrationStatus::Failed);
	assert_eq!(report.failure, Some(FailureReason::ExecutionTimeout));
	assert_eq!(report.exit_code, None);
	assert!(report.record_written);
	assert_eq!(report.error().unwrap().code(), "EXEC_001");

	assert_eq!(runner.invocation_count(), 1);
	assert_eq!(flaky.execution_writes(), 3);

	let store = flaky.inner().connect("staging").unwrap();
	let executions = store.executions(&version).unwrap();
	assert_eq!(executions.len(), 1);
	assert_eq!(executions[0].execution_id, report.execution_id);

	let record = store.find_record(&version).unwrap().unwrap();
	assert_eq!(record.status, MigrationStatus::Failed);
	assert_eq!(record.failure, Some(FailureReason::ExecutionTimeout));
	assert_eq!(record.execution_id, Some(report.execution_id));

	let chats = notifier.chats();
	assert_eq!(chats.len(), 1);
	assert_eq!(chats[0].message, "Migration 2024_01_add_users failed in staging: EXECUTION_TIMEOUT");

	let emails = notifier.emails();
	assert_eq!(emails.len(), 1);
	assert_eq!(emails[0].recipients, ["oncall@example.com"]);
	assert_eq!(emails[0].subject, "Migration 2024_01_add_users failed in staging");
}

#[test]
fn test_exhausted_write_attempts_are_reported() {
	let catalog = catalog();
	let flaky = Arc::new(FlakyConnector::new(MemoryConnector::new(["staging"]), 10));
	let runner = Arc::new(FakeRunner::succeeding());
	let sluice = sluice(
		config(&catalog).with_record_write_attempts(2),
		flaky.clone(),
		runner.clone(),
		Arc::new(RecordingNotifier::new()),
	);
	let dana = sluice.resolve_actor("dana").unwrap();

	let report = sluice.execute_migration("staging", &dana, &Version::from(ADD_USERS), false).unwrap();
	assert!(report.succeeded());
	assert!(!report.record_written);
	assert_eq!(flaky.execution_writes(), 2);
	assert_eq!(runner.invocation_count(), 1);
}

#[test]
fn test_nonzero_exit_fails() {
	let catalog = catalog();
	let memory = Arc::new(MemoryConnector::new(["staging"]));
	let runner = Arc::new(FakeRunner::exiting(1).with_stderr("ERROR: relation \"users\" already exists"));
	let sluice = sluice(config(&catalog), memory.clone(), runner, Arc::new(RecordingNotifier::new()));
	let dana = sluice.resolve_actor("dana").unwrap();
	let version = Version::from(ADD_USERS);

	let report = sluice.execute_migration("staging", &dana, &version, false).unwrap();
	assert_eq!(report.failure, Some(FailureReason::ExecutionFailed));
	assert_eq!(report.exit_code, Some(1));

	let err = report.error().unwrap();
	assert_eq!(err.code(), "EXEC_002");

	let entry = &memory.connect("staging").unwrap().executions(&version).unwrap()[0];
	assert_eq!(entry.exit_code, Some(1));
	assert!(entry.stderr.contains("already exists"));
}

#[test]
fn test_spawn_failure_writes_nothing() {
	let catalog = catalog();
	let memory = Arc::new(MemoryConnector::new(["staging"]));
	let notifier = Arc::new(RecordingNotifier::new());
	let sluice = sluice(config(&catalog), memory.clone(), Arc::new(FakeRunner::failing_to_spawn()), notifier.clone());
	let dana = sluice.resolve_actor("dana").unwrap();
	let version = Version::from(ADD_USERS);

	let err = sluice.execute_migration("staging", &dana, &version, false).unwrap_err();
	assert_eq!(err.code(), "EXEC_004");

	let store = memory.connect("staging").unwrap();
	assert!(store.find_record(&version).unwrap().is_none());
	assert!(store.executions(&version).unwrap().is_empty());
	assert!(notifier.chats().is_empty());
}

#[test]
fn test_notifier_failure_is_not_propagated() {
	let catalog = catalog();
	let memory = Arc::new(MemoryConnector::new(["staging"]));
	let sluice = sluice(config(&catalog), memory.clone(), Arc::new(FakeRunner::exiting(2)), Arc::new(FailingNotifier));
	let dana = sluice.resolve_actor("dana").unwrap();

	let report = sluice.execute_migration("staging", &dana, &Version::from(ADD_USERS), false).unwrap();
	assert_eq!(report.status, MigrationStatus::Failed);
	assert!(report.record_written);
}

#[test]
fn test_unreachable_store_blocks_execution() {
	let catalog = catalog();
	let memory = Arc::new(MemoryConnector::new(["staging"]));
	memory.set_reachable("staging", false);
	let runner = Arc::new(FakeRunner::succeeding());
	let sluice = sluice(config(&catalog), memory.clone(), runner.clone(), Arc::new(RecordingNotifier::new()));
	let dana = sluice.resolve_actor("dana").unwrap();

	let err = sluice.execute_migration("staging", &dana, &Version::from(ADD_USERS), false).unwrap_err();
	assert_eq!(err.code(), "STORE_001");
	assert_eq!(runner.invocation_count(), 0);
	assert!(!sluice.status("staging").unwrap().is_connected());
}

#[test]
fn test_concurrent_execution_is_exclusive() {
	let catalog = catalog();
	let memory = Arc::new(MemoryConnector::new(["staging"]));
	let runner = Arc::new(FakeRunner::succeeding().hold());
	let sluice = sluice(config(&catalog), memory.clone(), runner.clone(), Arc::new(RecordingNotifier::new()));
	let dana = sluice.resolve_actor("dana").unwrap();
	let version = Version::from(ADD_USERS);

	thread::scope(|s| {
		let first = s.spawn(|| sluice.execute_migration("staging", &dana, &version, false));

		assert!(runner.wait_for_invocations(1, Duration::from_secs(5)));

		let err = sluice.execute_migration("staging", &dana, &version, false).unwrap_err();
		assert_eq!(err.code(), "EXEC_003");

		runner.release();
		let report = first.join().unwrap().unwrap();
		assert!(report.succeeded());
	});

	let err = sluice.execute_migration("staging", &dana, &version, false).unwrap_err();
	assert_eq!(err.code(), "POLICY_003");

	assert_eq!(runner.invocation_count(), 1);
	assert_eq!(memory.connect("staging").unwrap().executions(&version).unwrap().len(), 1);
}
