// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use serde::{Deserialize, Serialize};
use sluice_type::RiskLevel;

/// Number of distinct-role approvals a migration needs before it may run.
pub trait ApprovalPolicy: Send + Sync {
	fn required_approvals(&self, risk: RiskLevel) -> usize;
}

/// Fixed count per risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdPolicy {
	pub low: usize,
	pub medium: usize,
	pub high: usize,
}

impl Default for ThresholdPolicy {
	fn default() -> Self {
		Self {
			low: 0,
			medium: 1,
			high: 2,
		}
	}
}

impl ApprovalPolicy for ThresholdPolicy {
	fn required_approvals(&self, risk: RiskLevel) -> usize {
		match risk {
			RiskLevel::Low => self.low,
			RiskLevel::Medium => self.medium,
			RiskLevel::High => self.high,
		}
	}
}
