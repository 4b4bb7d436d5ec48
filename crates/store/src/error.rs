// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use sluice_type::{
	MigrationStatus,
	error::{
		Diagnostic, Error, IntoDiagnostic,
		diagnostic::{config::unknown_environment, store},
	},
};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
	#[error("history store of '{environment}' is unavailable: {reason}")]
	Unavailable {
		environment: String,
		reason: String,
	},

	#[error("unknown environment '{environment}'")]
	UnknownEnvironment {
		environment: String,
	},

	#[error("migration '{version}' cannot move from {from} to {to}")]
	InvalidTransition {
		version: String,
		from: MigrationStatus,
		to: MigrationStatus,
	},

	#[error("{operation} failed: {reason}")]
	Query {
		operation: &'static str,
		reason: String,
	},
}

impl StoreError {
	pub(crate) fn query(operation: &'static str, reason: impl ToString) -> Self {
		StoreError::Query {
			operation,
			reason: reason.to_string(),
		}
	}
}

impl IntoDiagnostic for StoreError {
	fn into_diagnostic(self) -> Diagnostic {
		match self {
			StoreError::Unavailable {
				environment,
				reason,
			} => store::unavailable(&environment, reason),
			StoreError::UnknownEnvironment {
				environment,
			} => unknown_environment(&environment),
			StoreError::InvalidTransition {
				version,
				from,
				to,
			} => store::invalid_transition(&version, from.as_str(), to.as_str()),
			StoreError::Query {
				operation,
				reason,
			} => store::query_failed(operation, reason),
		}
	}
}

impl From<StoreError> for Error {
	fn from(err: StoreError) -> Self {
		Error(err.into_diagnostic())
	}
}
