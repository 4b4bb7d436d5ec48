// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! The programmatic surface: every call names its environment and, where it
//! changes state, its actor.

use std::sync::Arc;

use sluice_catalog::{CatalogError, MigrationCatalog};
use sluice_core::{
	interface::{ActorDirectory, EnvironmentProvider, HistoryConnector, HistoryStore, Notifier, Runner},
	model::{Actor, ApprovalRecord, Capability, EnvironmentConfig, MigrationDescriptor, MigrationRecord},
};
use sluice_policy::{ApprovalPolicy, PolicyError, approval_capabilities, can_approve, require};
use sluice_store::StoreError;
use sluice_type::{MigrationStatus, Result, Version};
use tracing::{debug, error, info, instrument, warn};

use crate::{
	config::SluiceConfig,
	dispatch::{DispatchSettings, ExecutionDispatcher, ExecutionReport},
	error::ConfigError,
	notify::TracingNotifier,
	report::{HistoryStatus, MigrationDetail, PendingMigration, StatusReport},
	runner::ProcessRunner,
	workflow::ApprovalWorkflow,
};

/// Records shown in a status report.
pub const RECENT_LIMIT: usize = 10;

pub struct Sluice {
	catalog: MigrationCatalog,
	connector: Arc<dyn HistoryConnector>,
	environments: Arc<dyn EnvironmentProvider>,
	actors: Arc<dyn ActorDirectory>,
	notifier: Arc<dyn Notifier>,
	workflow: ApprovalWorkflow,
	dispatcher: ExecutionDispatcher,
	chat_channel: String,
}

/// Collaborators left unset fall back to what the configuration describes.
pub struct SluiceBuilder {
	config: SluiceConfig,
	connector: Option<Arc<dyn HistoryConnector>>,
	environments: Option<Arc<dyn EnvironmentProvider>>,
	actors: Option<Arc<dyn ActorDirectory>>,
	runner: Option<Arc<dyn Runner>>,
	notifier: Option<Arc<dyn Notifier>>,
	policy: Option<Arc<dyn ApprovalPolicy>>,
}

impl SluiceBuilder {
	pub fn connector(mut self, connector: Arc<dyn HistoryConnector>) -> Self {
		self.connector = Some(connector);
		self
	}

	pub fn environments(mut self, environments: Arc<dyn EnvironmentProvider>) -> Self {
		self.environments = Some(environments);
		self
	}

	pub fn actors(mut self, actors: Arc<dyn ActorDirectory>) -> Self {
		self.actors = Some(actors);
		self
	}

	pub fn runner(mut self, runner: Arc<dyn Runner>) -> Self {
		self.runner = Some(runner);
		self
	}

	pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
		self.notifier = Some(notifier);
		self
	}

	pub fn policy(mut self, policy: Arc<dyn ApprovalPolicy>) -> Self {
		self.policy = Some(policy);
		self
	}

	pub fn build(self) -> Result<Sluice> {
		let config = self.config;
		config.validate()?;

		let catalog = MigrationCatalog::new(&config.migrations_dir);
		let connector = self.connector.unwrap_or_else(|| Arc::new(config.connector()));
		let environments = self.environments.unwrap_or_else(|| Arc::new(config.environments.clone()));
		let actors = self.actors.unwrap_or_else(|| Arc::new(config.actor_directory()));
		let runner = self.runner.unwrap_or_else(|| {
			Arc::new(ProcessRunner::new(&config.runner.program).with_args(config.runner.args.iter().cloned()))
		});
		let notifier = self.notifier.unwrap_or_else(|| Arc::new(TracingNotifier));
		let policy = self.policy.unwrap_or_else(|| Arc::new(config.approvals));

		let workflow = ApprovalWorkflow::new(policy);
		let dispatcher = ExecutionDispatcher::new(
			catalog.clone(),
			Arc::clone(&connector),
			workflow.clone(),
			runner,
			Arc::clone(&notifier),
			DispatchSettings {
				timeout: config.runner.timeout,
				record_write_attempts: config.runner.record_write_attempts,
				chat_channel: config.notifications.chat_channel.clone(),
				email_recipients: config.notifications.email_recipients.clone(),
			},
		);

		debug!(migrations_dir = %config.migrations_dir.display(), environments = environments.names().len(), "sluice ready");

		Ok(Sluice {
			catalog,
			connector,
			environments,
			actors,
			notifier,
			workflow,
			dispatcher,
			chat_channel: config.notifications.chat_channel,
		})
	}
}

impl Sluice {
	pub fn builder(config: SluiceConfig) -> SluiceBuilder {
		SluiceBuilder {
			config,
			connector: None,
			environments: None,
			actors: None,
			runner: None,
			notifier: None,
			policy: None,
		}
	}

	pub fn catalog(&self) -> &MigrationCatalog {
		&self.catalog
	}

	pub fn environment(&self, name: &str) -> Result<EnvironmentConfig> {
		Ok(self.environments.environment(name).ok_or_else(|| ConfigError::UnknownEnvironment {
			name: name.to_string(),
		})?)
	}

	pub fn resolve_actor(&self, username: &str) -> Result<Actor> {
		Ok(self.actors.resolve(username).ok_or_else(|| ConfigError::UnknownActor {
			username: username.to_string(),
		})?)
	}

	/// Summary, recent records and approval queue of an environment. An
	/// unreachable store yields [`HistoryStatus::Unavailable`].
	#[instrument(name = "engine::status", level = "debug", skip(self))]
	pub fn status(&self, environment: &str) -> Result<StatusReport> {
		self.environment(environment)?;

		let history = match self.connector.connect(environment).and_then(|store| snapshot(store.as_ref())) {
			Ok(history) => history,
			Err(e) => {
				warn!(code = %e.code, message = %e.message, "history store unavailable");
				HistoryStatus::Unavailable {
					diagnostic: e.diagnostic(),
				}
			}
		};

		Ok(StatusReport {
			environment: environment.to_string(),
			history,
		})
	}

	/// Catalog migrations absent from the applied set, in filename order.
	#[instrument(name = "engine::pending_migrations", level = "debug", skip(self))]
	pub fn pending_migrations(&self, environment: &str) -> Result<Vec<PendingMigration>> {
		self.environment(environment)?;
		let store = self.connector.connect(environment)?;

		let applied = store.applied_versions()?;
		self.catalog
			.pending(&applied)?
			.into_iter()
			.map(|descriptor| -> Result<PendingMigration> {
				let evaluation = self.workflow.evaluate(store.as_ref(), &descriptor)?;
				Ok(PendingMigration {
					descriptor,
					state: evaluation.state,
					approvals: evaluation.approvals,
					required: evaluation.required,
				})
			})
			.collect()
	}

	#[instrument(name = "engine::migration_detail", level = "debug", skip(self))]
	pub fn migration_detail(&self, environment: &str, version: &Version) -> Result<MigrationDetail> {
		self.environment(environment)?;
		let descriptor = self.descriptor(version)?;
		let store = self.connector.connect(environment)?;

		Ok(MigrationDetail {
			environment: environment.to_string(),
			evaluation: self.workflow.evaluate(store.as_ref(), &descriptor)?,
			approvals: store.approvals(version)?,
			executions: store.executions(version)?,
			descriptor,
		})
	}

	/// Records the actor's sign-off under their role. A repeated approval from
	/// the same role replaces the earlier one.
	#[instrument(name = "engine::add_approval", level = "info", skip(self, actor, comments), fields(username = %actor.username, role = %actor.role))]
	pub fn add_approval(
		&self,
		environment: &str,
		actor: &Actor,
		version: &Version,
		comments: &str,
	) -> Result<ApprovalRecord> {
		self.environment(environment)?;
		let descriptor = self.descriptor(version)?;

		if !can_approve(actor, descriptor.risk_level) {
			return Err(PolicyError::PermissionDenied {
				username: actor.username.clone(),
				capability: approval_capabilities(descriptor.risk_level)[0],
			}
			.into());
		}

		let store = self.connector.connect(environment)?;
		let approval = self.workflow.record_approval(store.as_ref(), version, &actor.role, &actor.username, comments)?;
		info!("migration approved");

		self.notify(&format!("Migration {} approved by {} ({})", version, actor.username, actor.role));
		Ok(approval)
	}

	pub fn execute_migration(
		&self,
		environment: &str,
		actor: &Actor,
		version: &Version,
		force: bool,
	) -> Result<ExecutionReport> {
		self.environment(environment)?;
		self.dispatcher.execute(actor, environment, version, force)
	}

	/// Opens the approval queue for a catalog migration that has no record yet.
	#[instrument(name = "engine::mark_pending", level = "info", skip(self, actor), fields(username = %actor.username))]
	pub fn mark_pending(&self, environment: &str, actor: &Actor, version: &Version) -> Result<MigrationRecord> {
		require(actor, Capability::CreateMigrations)?;
		self.environment(environment)?;
		let descriptor = self.descriptor(version)?;
		let store = self.connector.connect(environment)?;

		if let Some(existing) = store.find_record(version)? {
			if existing.status == MigrationStatus::PendingApproval {
				return Ok(existing);
			}
			return Err(StoreError::InvalidTransition {
				version: version.to_string(),
				from: existing.status,
				to: MigrationStatus::PendingApproval,
			}
			.into());
		}

		let record = MigrationRecord::pending(&descriptor);
		store.write_record(&record)?;
		info!("migration awaiting approval");
		Ok(record)
	}

	/// Marks an applied migration as reverted. The revert itself happens
	/// outside this system.
	#[instrument(name = "engine::mark_rolled_back", level = "info", skip(self, actor), fields(username = %actor.username))]
	pub fn mark_rolled_back(&self, environment: &str, actor: &Actor, version: &Version) -> Result<MigrationRecord> {
		require(actor, Capability::ApproveAll)?;
		self.environment(environment)?;
		let store = self.connector.connect(environment)?;

		let mut record = store.find_record(version)?.ok_or_else(|| CatalogError::NotFound {
			version: version.to_string(),
		})?;

		if record.status != MigrationStatus::Applied {
			return Err(StoreError::InvalidTransition {
				version: version.to_string(),
				from: record.status,
				to: MigrationStatus::RolledBack,
			}
			.into());
		}

		record.status = MigrationStatus::RolledBack;
		store.write_record(&record)?;
		info!("migration rolled back");

		self.notify(&format!("Migration {} rolled back in {} by {}", version, environment, actor.username));
		Ok(record)
	}

	fn descriptor(&self, version: &Version) -> Result<MigrationDescriptor> {
		Ok(self.catalog.find(version)?.ok_or_else(|| CatalogError::NotFound {
			version: version.to_string(),
		})?)
	}

	fn notify(&self, message: &str) {
		if let Err(e) = self.notifier.notify_chat(message, &self.chat_channel) {
			error!(code = %e.code, message = %e.message, "chat notification failed");
		}
	}
}

fn snapshot(store: &dyn HistoryStore) -> Result<HistoryStatus> {
	Ok(HistoryStatus::Connected {
		summary: store.summarize()?,
		recent: store.recent_records(RECENT_LIMIT)?,
		pending_approvals: store.pending_approvals()?,
	})
}

#[cfg(test)]
mod tests {
	use sluice_core::model::Role;
	use sluice_policy::RoleCapabilities;
	use sluice_store::MemoryConnector;
	use sluice_testing::{
		catalog::{CatalogDir, migration_sql},
		notify::RecordingNotifier,
		runner::FakeRunner,
		store::UnreachableConnector,
	};
	use sluice_type::RiskLevel;

	use super::*;

	struct Fixture {
		_catalog: CatalogDir,
		sluice: Sluice,
		notifier: Arc<RecordingNotifier>,
	}

	fn fixture(connector: Arc<dyn HistoryConnector>) -> Fixture {
		let catalog = CatalogDir::new()
			.with("2024_01_add_users", &migration_sql("Add users", RiskLevel::Low))
			.with("2024_02_drop_column", &migration_sql("Drop column", RiskLevel::High));
		let notifier = Arc::new(RecordingNotifier::new());

		let config = SluiceConfig::default()
			.with_migrations_dir(catalog.path())
			.with_environment(EnvironmentConfig::new("staging", "app_staging"))
			.with_actor("alice", Role::DataOpsLead)
			.with_actor("dev", Role::Developer);

		let sluice = Sluice::builder(config)
			.connector(connector)
			.runner(Arc::new(FakeRunner::succeeding()))
			.notifier(notifier.clone())
			.build()
			.unwrap();

		Fixture {
			_catalog: catalog,
			sluice,
			notifier,
		}
	}

	fn memory() -> Arc<dyn HistoryConnector> {
		Arc::new(MemoryConnector::new(["staging"]))
	}

	#[test]
	fn test_unknown_environment_and_actor() {
		let f = fixture(memory());
		assert_eq!(f.sluice.status("prod").unwrap_err().code(), "CONFIG_001");
		assert_eq!(f.sluice.resolve_actor("mallory").unwrap_err().code(), "CONFIG_003");
		assert_eq!(f.sluice.resolve_actor("alice").unwrap().role, Role::DataOpsLead);
	}

	#[test]
	fn test_status_degrades_when_unreachable() {
		let f = fixture(Arc::new(UnreachableConnector));
		let report = f.sluice.status("staging").unwrap();
		assert!(!report.is_connected());
		match report.history {
			HistoryStatus::Unavailable {
				diagnostic,
			} => assert_eq!(diagnostic.code, "STORE_001"),
			other => panic!("unexpected {:?}", other),
		}

		assert_eq!(f.sluice.pending_migrations("staging").unwrap_err().code(), "STORE_001");
	}

	#[test]
	fn test_add_approval_requires_capability() {
		let f = fixture(memory());
		let dev = f.sluice.resolve_actor("dev").unwrap();
		let err = f.sluice.add_approval("staging", &dev, &Version::from("2024_02_drop_column"), "lgtm").unwrap_err();
		assert_eq!(err.code(), "POLICY_001");
		assert!(f.notifier.chats().is_empty());
	}

	#[test]
	fn test_add_approval_notifies() {
		let f = fixture(memory());
		let alice = f.sluice.resolve_actor("alice").unwrap();
		f.sluice.add_approval("staging", &alice, &Version::from("2024_02_drop_column"), "lgtm").unwrap();

		let chats = f.notifier.chats();
		assert_eq!(chats.len(), 1);
		assert_eq!(chats[0].channel, "#data-ops");
		assert_eq!(chats[0].message, "Migration 2024_02_drop_column approved by alice (data_ops_lead)");
	}

	#[test]
	fn test_add_approval_unknown_version() {
		let f = fixture(memory());
		let alice = f.sluice.resolve_actor("alice").unwrap();
		let err = f.sluice.add_approval("staging", &alice, &Version::from("2099_01_nope"), "").unwrap_err();
		assert_eq!(err.code(), "CATALOG_002");
	}

	#[test]
	fn test_mark_pending_then_rolled_back_rejected() {
		let f = fixture(memory());
		let dev = f.sluice.resolve_actor("dev").unwrap();
		let version = Version::from("2024_02_drop_column");

		let record = f.sluice.mark_pending("staging", &dev, &version).unwrap();
		assert_eq!(record.status, MigrationStatus::PendingApproval);
		assert_eq!(record.risk_level, RiskLevel::High);
		assert_eq!(f.sluice.mark_pending("staging", &dev, &version).unwrap(), record);

		let admin = RoleCapabilities::standard().actor("root", Role::Admin);
		let err = f.sluice.mark_rolled_back("staging", &admin, &version).unwrap_err();
		assert_eq!(err.code(), "STORE_002");

		let err = f.sluice.mark_rolled_back("staging", &dev, &version).unwrap_err();
		assert_eq!(err.code(), "POLICY_001");
	}
}
