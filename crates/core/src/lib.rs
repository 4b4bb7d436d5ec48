// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

pub mod interface;
pub mod model;

pub use sluice_type::{Error, MigrationStatus, Result, RiskLevel, Version};
