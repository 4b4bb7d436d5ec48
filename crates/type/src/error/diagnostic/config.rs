// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::error::diagnostic::Diagnostic;

/// The environment name is not configured
pub fn unknown_environment(environment: &str) -> Diagnostic {
	Diagnostic {
		code: "CONFIG_001".to_string(),
		message: format!("Unknown environment '{}'", environment),
		label: None,
		help: Some("Add the environment to the configuration's environments list".to_string()),
		notes: vec![],
		cause: None,
	}
}

/// Configuration value rejected during validation
pub fn invalid_config(reason: impl Into<String>) -> Diagnostic {
	Diagnostic {
		code: "CONFIG_002".to_string(),
		message: format!("Invalid configuration: {}", reason.into()),
		label: None,
		help: Some("Check the configuration file".to_string()),
		notes: vec![],
		cause: None,
	}
}

/// The username is not known to the actor directory
pub fn unknown_actor(username: &str) -> Diagnostic {
	Diagnostic {
		code: "CONFIG_003".to_string(),
		message: format!("Unknown user '{}'", username),
		label: None,
		help: Some("Add the user to the actors list or pass a configured --user".to_string()),
		notes: vec![],
		cause: None,
	}
}
