// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use sluice_type::error::{
	Diagnostic, Error, IntoDiagnostic,
	diagnostic::catalog::{malformed_metadata, migration_not_found, unreadable_migration},
};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
	#[error("malformed {field} '{value}' in migration '{version}'")]
	MalformedMetadata {
		version: String,
		field: &'static str,
		value: String,
	},

	#[error("cannot read {path}: {reason}")]
	Unreadable {
		path: String,
		reason: String,
	},

	#[error("migration '{version}' not found")]
	NotFound {
		version: String,
	},
}

impl IntoDiagnostic for CatalogError {
	fn into_diagnostic(self) -> Diagnostic {
		match self {
			CatalogError::MalformedMetadata {
				version,
				field,
				value,
			} => malformed_metadata(&version, field, &value),
			CatalogError::Unreadable {
				path,
				reason,
			} => unreadable_migration(&path, reason),
			CatalogError::NotFound {
				version,
			} => migration_not_found(&version),
		}
	}
}

impl From<CatalogError> for Error {
	fn from(err: CatalogError) -> Self {
		Error(err.into_diagnostic())
	}
}
