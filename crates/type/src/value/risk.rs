// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fmt::{Display, Formatter},
	str::FromStr,
};

use serde::{Deserialize, Serialize};

/// Coarse risk classification driving how many approvals a migration needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
	#[default]
	Low,
	Medium,
	High,
}

impl RiskLevel {
	pub fn as_str(&self) -> &'static str {
		match self {
			RiskLevel::Low => "LOW",
			RiskLevel::Medium => "MEDIUM",
			RiskLevel::High => "HIGH",
		}
	}
}

impl Display for RiskLevel {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRiskLevelError(pub String);

impl Display for ParseRiskLevelError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "unknown risk level '{}'", self.0)
	}
}

impl std::error::Error for ParseRiskLevelError {}

impl FromStr for RiskLevel {
	type Err = ParseRiskLevelError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_uppercase().as_str() {
			"LOW" => Ok(RiskLevel::Low),
			"MEDIUM" => Ok(RiskLevel::Medium),
			"HIGH" => Ok(RiskLevel::High),
			_ => Err(ParseRiskLevelError(s.trim().to_string())),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_case_insensitive() {
		assert_eq!("high".parse::<RiskLevel>().unwrap(), RiskLevel::High);
		assert_eq!(" Medium ".parse::<RiskLevel>().unwrap(), RiskLevel::Medium);
		assert_eq!("LOW".parse::<RiskLevel>().unwrap(), RiskLevel::Low);
	}

	#[test]
	fn test_parse_unknown() {
		let err = "critical".parse::<RiskLevel>().unwrap_err();
		assert_eq!(err.0, "critical");
	}

	#[test]
	fn test_default_is_low() {
		assert_eq!(RiskLevel::default(), RiskLevel::Low);
	}
}
