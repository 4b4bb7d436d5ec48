// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::error::diagnostic::Diagnostic;

/// The actor does not hold the capability the operation requires
pub fn permission_denied(username: &str, capability: &str) -> Diagnostic {
	Diagnostic {
		code: "POLICY_001".to_string(),
		message: format!("Permission denied: '{}' lacks the '{}' capability", username, capability),
		label: None,
		help: Some("Ask an administrator to grant the capability to your role".to_string()),
		notes: vec![],
		cause: None,
	}
}

/// The approval threshold for the migration's risk level is not met
pub fn insufficient_approvals(version: &str, risk: &str, approvals: usize, required: usize) -> Diagnostic {
	Diagnostic {
		code: "POLICY_002".to_string(),
		message: format!(
			"Insufficient approvals for migration '{}': {} of {} required",
			version, approvals, required
		),
		label: Some(format!("risk level {}", risk)),
		help: Some("Collect approvals from distinct roles before executing".to_string()),
		notes: vec!["A second approval from the same role replaces the first one".to_string()],
		cause: None,
	}
}

/// Applied migrations are never executed again
pub fn already_applied(version: &str, environment: &str) -> Diagnostic {
	Diagnostic {
		code: "POLICY_003".to_string(),
		message: format!("Migration '{}' is already applied to '{}'", version, environment),
		label: None,
		help: Some("Roll the migration back before running it again".to_string()),
		notes: vec![],
		cause: None,
	}
}
