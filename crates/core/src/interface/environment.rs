// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::model::EnvironmentConfig;

/// Supplies per-environment connection parameters keyed by environment name.
pub trait EnvironmentProvider: Send + Sync {
	fn environment(&self, name: &str) -> Option<EnvironmentConfig>;

	fn names(&self) -> Vec<String>;
}

impl EnvironmentProvider for Vec<EnvironmentConfig> {
	fn environment(&self, name: &str) -> Option<EnvironmentConfig> {
		self.iter().find(|e| e.name == name).cloned()
	}

	fn names(&self) -> Vec<String> {
		self.iter().map(|e| e.name.clone()).collect()
	}
}
