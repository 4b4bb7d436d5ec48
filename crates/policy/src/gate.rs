// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use sluice_core::model::{Actor, Capability};
use sluice_type::RiskLevel;
use tracing::debug;

use crate::error::PolicyError;

/// Membership in the actor's permission set. `execute` is also granted by
/// `approve_all`.
pub fn has_capability(actor: &Actor, capability: Capability) -> bool {
	if actor.permissions.contains(&capability) {
		return true;
	}

	capability == Capability::Execute && actor.permissions.contains(&Capability::ApproveAll)
}

pub fn require(actor: &Actor, capability: Capability) -> Result<(), PolicyError> {
	if has_capability(actor, capability) {
		return Ok(());
	}

	debug!(username = %actor.username, role = %actor.role, capability = %capability, "permission denied");
	Err(PolicyError::PermissionDenied {
		username: actor.username.clone(),
		capability,
	})
}

/// Capabilities any of which lets an actor sign off a migration. Every risk
/// level takes the same sign-off; risk only changes how many are required.
pub fn approval_capabilities(_risk: RiskLevel) -> &'static [Capability] {
	&[Capability::ApproveHighRisk, Capability::ApproveAll]
}

pub fn can_approve(actor: &Actor, risk: RiskLevel) -> bool {
	approval_capabilities(risk).iter().any(|c| has_capability(actor, *c))
}

#[cfg(test)]
mod tests {
	use sluice_core::model::Role;

	use super::*;

	fn actor(role: Role, permissions: &[Capability]) -> Actor {
		Actor::new("tester", role, permissions.iter().copied())
	}

	#[test]
	fn test_membership() {
		let dev = actor(Role::Developer, &[Capability::ViewOwn, Capability::CreateMigrations]);
		assert!(has_capability(&dev, Capability::CreateMigrations));
		assert!(!has_capability(&dev, Capability::Execute));
		assert!(!has_capability(&dev, Capability::EmergencyDeploy));
	}

	#[test]
	fn test_approve_all_implies_execute() {
		let dba = actor(Role::Dba, &[Capability::ApproveAll]);
		assert!(has_capability(&dba, Capability::Execute));

		let lead = actor(Role::DataOpsLead, &[Capability::ApproveHighRisk]);
		assert!(!has_capability(&lead, Capability::Execute));
	}

	#[test]
	fn test_require_reports_capability() {
		let dev = actor(Role::Developer, &[]);
		let err = require(&dev, Capability::Execute).unwrap_err();
		assert_eq!(
			err,
			PolicyError::PermissionDenied {
				username: "tester".to_string(),
				capability: Capability::Execute,
			}
		);
	}

	#[test]
	fn test_can_approve() {
		let lead = actor(Role::DataOpsLead, &[Capability::ApproveHighRisk]);
		let dba = actor(Role::Dba, &[Capability::ApproveAll]);
		let dev = actor(Role::Developer, &[Capability::CreateMigrations]);

		for risk in [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High] {
			assert!(can_approve(&lead, risk));
			assert!(can_approve(&dba, risk));
			assert!(!can_approve(&dev, risk));
		}
	}
}
