// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{fs, path::Path};

use sluice_type::RiskLevel;

use crate::tempdir::TempDir;

/// A throwaway migrations directory populated through a builder.
///
/// ```ignore
/// let dir = CatalogDir::new()
/// 	.with("2024_01_add_users", &migration_sql("Add users", RiskLevel::Low));
/// ```
#[derive(Debug)]
pub struct CatalogDir {
	dir: TempDir,
}

impl CatalogDir {
	pub fn new() -> Self {
		Self {
			dir: TempDir::new().expect("create catalog dir"),
		}
	}

	/// Adds `<version>.sql`.
	pub fn with(self, version: &str, sql: &str) -> Self {
		self.with_file(&format!("{}.sql", version), sql)
	}

	pub fn with_file(self, name: &str, content: &str) -> Self {
		self.with_bytes(name, content.as_bytes())
	}

	pub fn with_bytes(self, name: &str, content: &[u8]) -> Self {
		fs::write(self.dir.path().join(name), content).expect("write catalog file");
		self
	}

	pub fn path(&self) -> &Path {
		self.dir.path()
	}
}

impl Default for CatalogDir {
	fn default() -> Self {
		Self::new()
	}
}

/// A migration file with a complete metadata header.
pub fn migration_sql(description: &str, risk: RiskLevel) -> String {
	format!(
		"-- Description: {}\n\
		 -- Risk Level: {}\n\
		 -- Estimated Duration: 1 minute\n\
		 -- Author: test\n\
		 -- Created: 2024-01-01\n\
		 SELECT 1;\n",
		description, risk
	)
}
