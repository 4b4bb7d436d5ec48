// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	collections::BTreeSet,
	fmt::{Display, Formatter},
	str::FromStr,
};

use serde::{Deserialize, Serialize};

/// Role of an actor. Identity providers with their own role names map into
/// `Other`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
	Developer,
	SeniorDeveloper,
	DataOpsLead,
	Dba,
	Admin,
	Other(String),
}

impl Role {
	pub fn as_str(&self) -> &str {
		match self {
			Role::Developer => "developer",
			Role::SeniorDeveloper => "senior_developer",
			Role::DataOpsLead => "data_ops_lead",
			Role::Dba => "dba",
			Role::Admin => "data_ops_admin",
			Role::Other(name) => name.as_str(),
		}
	}
}

impl Display for Role {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

impl From<&str> for Role {
	fn from(value: &str) -> Self {
		match value {
			"developer" => Role::Developer,
			"senior_developer" => Role::SeniorDeveloper,
			"data_ops_lead" => Role::DataOpsLead,
			"dba" => Role::Dba,
			"data_ops_admin" | "admin" => Role::Admin,
			other => Role::Other(other.to_string()),
		}
	}
}

impl From<String> for Role {
	fn from(value: String) -> Self {
		Role::from(value.as_str())
	}
}

impl From<Role> for String {
	fn from(value: Role) -> Self {
		value.as_str().to_string()
	}
}

/// A named permission checked by the permission gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
	ApproveHighRisk,
	ApproveAll,
	ManageLocks,
	ViewAll,
	ViewOwn,
	CreateMigrations,
	EmergencyDeploy,
	Execute,
}

impl Capability {
	pub const ALL: [Capability; 8] = [
		Capability::ApproveHighRisk,
		Capability::ApproveAll,
		Capability::ManageLocks,
		Capability::ViewAll,
		Capability::ViewOwn,
		Capability::CreateMigrations,
		Capability::EmergencyDeploy,
		Capability::Execute,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			Capability::ApproveHighRisk => "approve_high_risk",
			Capability::ApproveAll => "approve_all",
			Capability::ManageLocks => "manage_locks",
			Capability::ViewAll => "view_all",
			Capability::ViewOwn => "view_own",
			Capability::CreateMigrations => "create_migrations",
			Capability::EmergencyDeploy => "emergency_deploy",
			Capability::Execute => "execute",
		}
	}
}

impl Display for Capability {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCapabilityError(pub String);

impl Display for ParseCapabilityError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "unknown capability '{}'", self.0)
	}
}

impl std::error::Error for ParseCapabilityError {}

impl FromStr for Capability {
	type Err = ParseCapabilityError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Capability::ALL.into_iter().find(|c| c.as_str() == s).ok_or_else(|| ParseCapabilityError(s.to_string()))
	}
}

/// The caller of a workflow operation, supplied by an external identity
/// provider. Never persisted; approvals and executions reference it by role
/// and username only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
	pub username: String,
	pub role: Role,
	pub permissions: BTreeSet<Capability>,
}

impl Actor {
	pub fn new(username: impl Into<String>, role: Role, permissions: impl IntoIterator<Item = Capability>) -> Self {
		Self {
			username: username.into(),
			role,
			permissions: permissions.into_iter().collect(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_role_round_trip() {
		for name in ["developer", "senior_developer", "data_ops_lead", "dba", "data_ops_admin", "release_manager"] {
			assert_eq!(Role::from(name).as_str(), name);
		}
		assert_eq!(Role::from("admin"), Role::Admin);
		assert_eq!(Role::from("release_manager"), Role::Other("release_manager".to_string()));
	}

	#[test]
	fn test_role_serializes_as_string() {
		let json = serde_json::to_string(&Role::DataOpsLead).unwrap();
		assert_eq!(json, "\"data_ops_lead\"");
		let role: Role = serde_json::from_str("\"qa\"").unwrap();
		assert_eq!(role, Role::Other("qa".to_string()));
	}

	#[test]
	fn test_capability_parse() {
		assert_eq!("emergency_deploy".parse::<Capability>().unwrap(), Capability::EmergencyDeploy);
		assert!("deploy_everything".parse::<Capability>().is_err());
	}

	#[test]
	fn test_actor_deserializes_capabilities() {
		let actor: Actor = serde_json::from_str(
			r#"{"username":"alice","role":"data_ops_lead","permissions":["view_all","approve_high_risk"]}"#,
		)
		.unwrap();
		assert_eq!(actor.role, Role::DataOpsLead);
		assert!(actor.permissions.contains(&Capability::ApproveHighRisk));
	}
}
