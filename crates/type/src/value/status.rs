// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fmt::{Display, Formatter},
	str::FromStr,
};

use serde::{Deserialize, Serialize};

/// Status of a migration record in the history ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MigrationStatus {
	PendingApproval,
	Applied,
	RolledBack,
	Failed,
}

impl MigrationStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			MigrationStatus::PendingApproval => "PENDING_APPROVAL",
			MigrationStatus::Applied => "APPLIED",
			MigrationStatus::RolledBack => "ROLLED_BACK",
			MigrationStatus::Failed => "FAILED",
		}
	}

	/// Whether the status was produced by an execution or a rollback.
	pub fn is_terminal(&self) -> bool {
		!matches!(self, MigrationStatus::PendingApproval)
	}

	/// Transitions the ledger accepts. Records are never deleted, and a
	/// pending marker never overwrites an execution outcome.
	pub fn can_transition_to(&self, next: MigrationStatus) -> bool {
		match (self, next) {
			(MigrationStatus::PendingApproval, _) => true,
			(MigrationStatus::Applied, MigrationStatus::RolledBack) => true,
			(MigrationStatus::Applied, _) => false,
			(MigrationStatus::Failed | MigrationStatus::RolledBack, MigrationStatus::PendingApproval) => false,
			(MigrationStatus::Failed | MigrationStatus::RolledBack, MigrationStatus::Applied) => true,
			(MigrationStatus::Failed | MigrationStatus::RolledBack, MigrationStatus::Failed) => true,
			(MigrationStatus::Failed, MigrationStatus::RolledBack) => false,
			(MigrationStatus::RolledBack, MigrationStatus::RolledBack) => false,
		}
	}
}

impl Display for MigrationStatus {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMigrationStatusError(pub String);

impl Display for ParseMigrationStatusError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "unknown migration status '{}'", self.0)
	}
}

impl std::error::Error for ParseMigrationStatusError {}

impl FromStr for MigrationStatus {
	type Err = ParseMigrationStatusError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"PENDING_APPROVAL" => Ok(MigrationStatus::PendingApproval),
			"APPLIED" => Ok(MigrationStatus::Applied),
			"ROLLED_BACK" => Ok(MigrationStatus::RolledBack),
			"FAILED" => Ok(MigrationStatus::Failed),
			other => Err(ParseMigrationStatusError(other.to_string())),
		}
	}
}
