// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Deployment configuration of the workflow.

use std::{
	collections::{BTreeMap, BTreeSet, HashSet},
	path::PathBuf,
	time::Duration,
};

use serde::{Deserialize, Serialize};
use sluice_core::model::{Capability, EnvironmentConfig, Role};
use sluice_policy::{RoleCapabilities, StaticActors, ThresholdPolicy};
use sluice_store::{BackendConnector, MemoryConnector, SqliteConfig, SqliteConnector};

use crate::error::ConfigError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_RECORD_WRITE_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
	pub program: PathBuf,
	/// Placed before `migrate <environment> [--force]`.
	pub args: Vec<String>,
	#[serde(rename = "timeout_secs", with = "secs")]
	pub timeout: Duration,
	pub record_write_attempts: usize,
}

impl Default for RunnerConfig {
	fn default() -> Self {
		Self {
			program: PathBuf::from("./migrate.sh"),
			args: vec![],
			timeout: DEFAULT_TIMEOUT,
			record_write_attempts: DEFAULT_RECORD_WRITE_ATTEMPTS,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
	pub chat_channel: String,
	pub email_recipients: Vec<String>,
}

impl Default for NotificationConfig {
	fn default() -> Self {
		Self {
			chat_channel: "#data-ops".to_string(),
			email_recipients: vec![],
		}
	}
}

/// Where each environment's history lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "backend")]
pub enum StoreConfig {
	Memory,
	/// One database file per environment, `<dir>/<database>.db`.
	Sqlite {
		dir: PathBuf,
	},
}

impl Default for StoreConfig {
	fn default() -> Self {
		StoreConfig::Sqlite {
			dir: PathBuf::from("history"),
		}
	}
}

/// A known user. `permissions` replaces the role's capability set when given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorConfig {
	pub username: String,
	pub role: Role,
	#[serde(default)]
	pub permissions: Option<BTreeSet<Capability>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SluiceConfig {
	pub migrations_dir: PathBuf,
	pub runner: RunnerConfig,
	pub approvals: ThresholdPolicy,
	pub notifications: NotificationConfig,
	pub store: StoreConfig,
	pub environments: Vec<EnvironmentConfig>,
	pub actors: Vec<ActorConfig>,
	/// Capability sets replacing the standard role table, keyed by role name.
	pub roles: BTreeMap<Role, BTreeSet<Capability>>,
}

impl Default for SluiceConfig {
	fn default() -> Self {
		Self {
			migrations_dir: PathBuf::from("migrations"),
			runner: RunnerConfig::default(),
			approvals: ThresholdPolicy::default(),
			notifications: NotificationConfig::default(),
			store: StoreConfig::default(),
			environments: vec![],
			actors: vec![],
			roles: BTreeMap::new(),
		}
	}
}

impl SluiceConfig {
	pub fn with_migrations_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.migrations_dir = dir.into();
		self
	}

	pub fn with_runner_program(mut self, program: impl Into<PathBuf>) -> Self {
		self.runner.program = program.into();
		self
	}

	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.runner.timeout = timeout;
		self
	}

	pub fn with_record_write_attempts(mut self, attempts: usize) -> Self {
		self.runner.record_write_attempts = attempts;
		self
	}

	pub fn with_approvals(mut self, approvals: ThresholdPolicy) -> Self {
		self.approvals = approvals;
		self
	}

	pub fn with_chat_channel(mut self, channel: impl Into<String>) -> Self {
		self.notifications.chat_channel = channel.into();
		self
	}

	pub fn with_email_recipients<I, S>(mut self, recipients: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.notifications.email_recipients = recipients.into_iter().map(Into::into).collect();
		self
	}

	pub fn with_store(mut self, store: StoreConfig) -> Self {
		self.store = store;
		self
	}

	pub fn with_environment(mut self, environment: EnvironmentConfig) -> Self {
		self.environments.push(environment);
		self
	}

	pub fn with_actor(mut self, username: impl Into<String>, role: Role) -> Self {
		self.actors.push(ActorConfig {
			username: username.into(),
			role,
			permissions: None,
		});
		self
	}

	pub fn with_role(mut self, role: Role, capabilities: impl IntoIterator<Item = Capability>) -> Self {
		self.roles.insert(role, capabilities.into_iter().collect());
		self
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.runner.program.as_os_str().is_empty() {
			return Err(ConfigError::invalid("runner.program must not be empty"));
		}
		if self.runner.timeout.is_zero() {
			return Err(ConfigError::invalid("runner.timeout_secs must be greater than zero"));
		}
		if self.runner.record_write_attempts == 0 {
			return Err(ConfigError::invalid("runner.record_write_attempts must be at least 1"));
		}

		let mut seen = HashSet::new();
		for environment in &self.environments {
			if environment.name.is_empty() {
				return Err(ConfigError::invalid("environment names must not be empty"));
			}
			if !seen.insert(environment.name.as_str()) {
				return Err(ConfigError::invalid(format!("duplicate environment '{}'", environment.name)));
			}
		}

		let mut seen = HashSet::new();
		for actor in &self.actors {
			if !seen.insert(actor.username.as_str()) {
				return Err(ConfigError::invalid(format!("duplicate actor '{}'", actor.username)));
			}
		}

		Ok(())
	}

	pub fn role_capabilities(&self) -> RoleCapabilities {
		self.roles
			.iter()
			.fold(RoleCapabilities::standard(), |table, (role, caps)| table.with_role(role.clone(), caps.iter().copied()))
	}

	pub fn actor_directory(&self) -> StaticActors {
		let roles = self.role_capabilities();
		StaticActors::new(self.actors.iter().map(|a| match &a.permissions {
			Some(permissions) => sluice_core::model::Actor::new(&a.username, a.role.clone(), permissions.iter().copied()),
			None => roles.actor(&a.username, a.role.clone()),
		}))
	}

	/// The history connector for the configured backend and environments.
	pub fn connector(&self) -> BackendConnector {
		match &self.store {
			StoreConfig::Memory => {
				BackendConnector::Memory(MemoryConnector::new(self.environments.iter().map(|e| e.name.clone())))
			}
			StoreConfig::Sqlite {
				dir,
			} => BackendConnector::Sqlite(SqliteConnector::new(self.environments.iter().map(|e| {
				let database = if e.database.is_empty() { e.name.as_str() } else { e.database.as_str() };
				(e.name.clone(), SqliteConfig::new(dir.join(format!("{}.db", database))))
			}))),
		}
	}
}

mod secs {
	use std::time::Duration;

	use serde::{Deserialize, Deserializer, Serializer};

	pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_u64(value.as_secs())
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
		Ok(Duration::from_secs(u64::deserialize(deserializer)?))
	}
}

#[cfg(test)]
mod tests {
	use sluice_core::interface::ActorDirectory;
	use sluice_type::RiskLevel;

	use super::*;

	#[test]
	fn test_defaults() {
		let config = SluiceConfig::default();
		assert_eq!(config.runner.timeout, Duration::from_secs(300));
		assert_eq!(config.runner.record_write_attempts, 3);
		assert_eq!(config.notifications.chat_channel, "#data-ops");
		assert!(config.validate().is_ok());
	}

	#[test]
	fn test_deserialize_partial() {
		let config: SluiceConfig = serde_json::from_str(
			r#"{
				"migrations_dir": "db/migrations",
				"runner": {"program": "/opt/bin/migrate.sh", "timeout_secs": 60},
				"approvals": {"high": 3},
				"store": {"backend": "memory"},
				"environments": [{"name": "staging", "database": "app_staging"}],
				"actors": [
					{"username": "alice", "role": "data_ops_lead"},
					{"username": "erin", "role": "developer", "permissions": ["emergency_deploy"]}
				]
			}"#,
		)
		.unwrap();

		assert_eq!(config.runner.timeout, Duration::from_secs(60));
		assert_eq!(config.runner.record_write_attempts, 3);
		assert_eq!(config.approvals.high, 3);
		assert_eq!(config.approvals.medium, 1);
		assert_eq!(config.store, StoreConfig::Memory);
		assert_eq!(config.environments[0].host, "localhost");

		let actors = config.actor_directory();
		let alice = actors.resolve("alice").unwrap();
		assert!(alice.permissions.contains(&Capability::ApproveHighRisk));
		let erin = actors.resolve("erin").unwrap();
		assert_eq!(erin.permissions.len(), 1);
		assert!(erin.permissions.contains(&Capability::EmergencyDeploy));
	}

	#[test]
	fn test_validate_rejects() {
		let zero_timeout = SluiceConfig::default().with_timeout(Duration::ZERO);
		assert!(matches!(zero_timeout.validate(), Err(ConfigError::Invalid { .. })));

		let zero_attempts = SluiceConfig::default().with_record_write_attempts(0);
		assert!(zero_attempts.validate().is_err());

		let empty_program = SluiceConfig::default().with_runner_program("");
		assert!(empty_program.validate().is_err());

		let duplicate = SluiceConfig::default()
			.with_environment(EnvironmentConfig::new("staging", "a"))
			.with_environment(EnvironmentConfig::new("staging", "b"));
		assert!(duplicate.validate().is_err());
	}

	#[test]
	fn test_role_override() {
		let config = SluiceConfig::default()
			.with_role(Role::DataOpsLead, [Capability::ViewAll])
			.with_actor("alice", Role::DataOpsLead);

		let alice = config.actor_directory().resolve("alice").unwrap();
		assert!(!sluice_policy::can_approve(&alice, RiskLevel::High));
	}
}
