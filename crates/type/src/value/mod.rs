// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

mod risk;
mod status;
mod version;

pub use risk::{ParseRiskLevelError, RiskLevel};
pub use status::{MigrationStatus, ParseMigrationStatusError};
pub use version::Version;
