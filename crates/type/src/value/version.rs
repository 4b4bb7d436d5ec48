// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	borrow::Borrow,
	fmt::{Display, Formatter},
};

use serde::{Deserialize, Serialize};

/// Migration version: the catalog filename without its `.sql` extension.
/// Ordering is lexical, which matches the catalog listing order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
	pub fn new(version: impl Into<String>) -> Self {
		Self(version.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl Display for Version {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.0)
	}
}

impl Borrow<str> for Version {
	fn borrow(&self) -> &str {
		&self.0
	}
}

impl From<&str> for Version {
	fn from(value: &str) -> Self {
		Self(value.to_string())
	}
}

impl From<String> for Version {
	fn from(value: String) -> Self {
		Self(value)
	}
}

#[cfg(test)]
mod tests {
	use std::collections::BTreeSet;

	use super::*;

	#[test]
	fn test_lexical_order() {
		let versions: BTreeSet<Version> =
			["2024_02_drop_column", "2024_01_add_users", "2023_12_init"].into_iter().map(Version::from).collect();
		let ordered: Vec<&str> = versions.iter().map(|v| v.as_str()).collect();
		assert_eq!(ordered, vec!["2023_12_init", "2024_01_add_users", "2024_02_drop_column"]);
	}

	#[test]
	fn test_borrow_lookup() {
		let versions: BTreeSet<Version> = [Version::from("2024_01_add_users")].into_iter().collect();
		assert!(versions.contains("2024_01_add_users"));
	}
}
