// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::error::diagnostic::Diagnostic;

/// The external runner exceeded its wall-clock bound
pub fn timeout(version: &str, timeout_secs: u64) -> Diagnostic {
	Diagnostic {
		code: "EXEC_001".to_string(),
		message: format!("Migration '{}' timed out after {} seconds", version, timeout_secs),
		label: None,
		help: Some("The runner was killed; inspect the database before retrying".to_string()),
		notes: vec!["The migration may have partially run".to_string()],
		cause: None,
	}
}

/// The external runner exited with a nonzero status
pub fn failed(version: &str, exit_code: Option<i32>, stderr: &str) -> Diagnostic {
	let status = match exit_code {
		Some(code) => format!("exit code {}", code),
		None => "termination by signal".to_string(),
	};

	let mut notes = vec![];
	if !stderr.trim().is_empty() {
		notes.push(format!("stderr: {}", stderr.trim()));
	}

	Diagnostic {
		code: "EXEC_002".to_string(),
		message: format!("Migration '{}' failed with {}", version, status),
		label: None,
		help: Some("Inspect the runner output and fix the migration".to_string()),
		notes,
		cause: None,
	}
}

/// Another execution of the same migration holds the lock
pub fn in_progress(version: &str, environment: &str) -> Diagnostic {
	Diagnostic {
		code: "EXEC_003".to_string(),
		message: format!("Migration '{}' is already executing on '{}'", version, environment),
		label: None,
		help: Some("Wait for the running execution to finish".to_string()),
		notes: vec![],
		cause: None,
	}
}

/// The runner process could not be started
pub fn spawn_failed(program: &str, reason: impl Into<String>) -> Diagnostic {
	Diagnostic {
		code: "EXEC_004".to_string(),
		message: format!("Failed to start migration runner '{}': {}", program, reason.into()),
		label: None,
		help: Some("Check the runner program path in the configuration".to_string()),
		notes: vec![],
		cause: None,
	}
}
