// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::error::diagnostic::Diagnostic;

/// The environment's history store cannot be reached
pub fn unavailable(environment: &str, reason: impl Into<String>) -> Diagnostic {
	Diagnostic {
		code: "STORE_001".to_string(),
		message: format!("Unable to connect to the history store of '{}': {}", environment, reason.into()),
		label: None,
		help: Some("Check the environment's connection parameters and availability".to_string()),
		notes: vec!["No changes were written".to_string()],
		cause: None,
	}
}

/// A status transition that the ledger does not allow
pub fn invalid_transition(version: &str, from: &str, to: &str) -> Diagnostic {
	Diagnostic {
		code: "STORE_002".to_string(),
		message: format!("Migration '{}' cannot move from {} to {}", version, from, to),
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}

/// A query against a reachable store failed
pub fn query_failed(operation: &str, reason: impl Into<String>) -> Diagnostic {
	Diagnostic {
		code: "STORE_003".to_string(),
		message: format!("History store {} failed: {}", operation, reason.into()),
		label: None,
		help: Some("Check history store integrity".to_string()),
		notes: vec![],
		cause: None,
	}
}
