// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

pub mod error;
pub mod value;

pub use error::{Error, Result};
pub use value::{MigrationStatus, RiskLevel, Version};
