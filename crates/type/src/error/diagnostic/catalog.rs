// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::error::diagnostic::Diagnostic;

/// A metadata header field could not be interpreted
pub fn malformed_metadata(version: &str, field: &str, value: &str) -> Diagnostic {
	Diagnostic {
		code: "CATALOG_001".to_string(),
		message: format!("Malformed metadata in migration '{}': {} '{}'", version, field, value),
		label: Some(format!("-- {}: {}", field, value)),
		help: Some("Use one of LOW, MEDIUM or HIGH for the risk level".to_string()),
		notes: vec!["The field falls back to its default value".to_string()],
		cause: None,
	}
}

/// The migration file could not be read
pub fn unreadable_migration(path: &str, reason: impl Into<String>) -> Diagnostic {
	Diagnostic {
		code: "CATALOG_001".to_string(),
		message: format!("Cannot read migration file {}: {}", path, reason.into()),
		label: None,
		help: Some("Migration files must be readable UTF-8 text".to_string()),
		notes: vec!["The file is skipped from the catalog listing".to_string()],
		cause: None,
	}
}

/// No migration file exists for the requested version
pub fn migration_not_found(version: &str) -> Diagnostic {
	Diagnostic {
		code: "CATALOG_002".to_string(),
		message: format!("Migration '{}' not found in the catalog", version),
		label: None,
		help: Some(format!("Expected a file named {}.sql in the migrations directory", version)),
		notes: vec![],
		cause: None,
	}
}
