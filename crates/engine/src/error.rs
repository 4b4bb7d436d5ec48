// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use sluice_type::error::{
	Diagnostic, Error, IntoDiagnostic,
	diagnostic::{config, execute},
};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExecuteError {
	#[error("migration '{version}' timed out after {timeout_secs}s")]
	Timeout {
		version: String,
		timeout_secs: u64,
	},

	#[error("migration '{version}' failed with exit code {exit_code:?}")]
	Failed {
		version: String,
		exit_code: Option<i32>,
		stderr: String,
	},

	#[error("migration '{version}' is already executing on '{environment}'")]
	InProgress {
		version: String,
		environment: String,
	},

	#[error("cannot start runner '{program}': {reason}")]
	SpawnFailed {
		program: String,
		reason: String,
	},
}

impl IntoDiagnostic for ExecuteError {
	fn into_diagnostic(self) -> Diagnostic {
		match self {
			ExecuteError::Timeout {
				version,
				timeout_secs,
			} => execute::timeout(&version, timeout_secs),
			ExecuteError::Failed {
				version,
				exit_code,
				stderr,
			} => execute::failed(&version, exit_code, &stderr),
			ExecuteError::InProgress {
				version,
				environment,
			} => execute::in_progress(&version, &environment),
			ExecuteError::SpawnFailed {
				program,
				reason,
			} => execute::spawn_failed(&program, reason),
		}
	}
}

impl From<ExecuteError> for Error {
	fn from(err: ExecuteError) -> Self {
		Error(err.into_diagnostic())
	}
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
	#[error("unknown environment '{name}'")]
	UnknownEnvironment {
		name: String,
	},

	#[error("unknown user '{username}'")]
	UnknownActor {
		username: String,
	},

	#[error("{reason}")]
	Invalid {
		reason: String,
	},
}

impl ConfigError {
	pub(crate) fn invalid(reason: impl Into<String>) -> Self {
		ConfigError::Invalid {
			reason: reason.into(),
		}
	}
}

impl IntoDiagnostic for ConfigError {
	fn into_diagnostic(self) -> Diagnostic {
		match self {
			ConfigError::UnknownEnvironment {
				name,
			} => config::unknown_environment(&name),
			ConfigError::UnknownActor {
				username,
			} => config::unknown_actor(&username),
			ConfigError::Invalid {
				reason,
			} => config::invalid_config(reason),
		}
	}
}

impl From<ConfigError> for Error {
	fn from(err: ConfigError) -> Self {
		Error(err.into_diagnostic())
	}
}
