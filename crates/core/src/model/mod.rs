// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

mod actor;
mod environment;
mod migration;

pub use actor::{Actor, Capability, ParseCapabilityError, Role};
pub use environment::EnvironmentConfig;
pub use migration::{
	ApprovalRecord, ExecutionEntry, FailureReason, HistorySummary, MigrationDescriptor, MigrationRecord,
	PendingApproval,
};
