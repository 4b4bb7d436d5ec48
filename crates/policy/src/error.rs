// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use sluice_core::model::Capability;
use sluice_type::{
	RiskLevel,
	error::{
		Diagnostic, Error, IntoDiagnostic,
		diagnostic::policy::{already_applied, insufficient_approvals, permission_denied},
	},
};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolicyError {
	#[error("'{username}' lacks the '{capability}' capability")]
	PermissionDenied {
		username: String,
		capability: Capability,
	},

	#[error("migration '{version}' ({risk}) has {approvals} of {required} required approvals")]
	InsufficientApprovals {
		version: String,
		risk: RiskLevel,
		approvals: usize,
		required: usize,
	},

	#[error("migration '{version}' is already applied to '{environment}'")]
	AlreadyApplied {
		version: String,
		environment: String,
	},
}

impl IntoDiagnostic for PolicyError {
	fn into_diagnostic(self) -> Diagnostic {
		match self {
			PolicyError::PermissionDenied {
				username,
				capability,
			} => permission_denied(&username, capability.as_str()),
			PolicyError::InsufficientApprovals {
				version,
				risk,
				approvals,
				required,
			} => insufficient_approvals(&version, risk.as_str(), approvals, required),
			PolicyError::AlreadyApplied {
				version,
				environment,
			} => already_applied(&version, &environment),
		}
	}
}

impl From<PolicyError> for Error {
	fn from(err: PolicyError) -> Self {
		Error(err.into_diagnostic())
	}
}
