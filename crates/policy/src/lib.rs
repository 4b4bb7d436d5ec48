// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Who may do what, and how many sign-offs a migration needs.
//!
//! The permission gate is a set of pure functions over an actor's capability
//! set. Approval thresholds sit behind [`ApprovalPolicy`] so deployments can
//! replace the default risk table.

mod actors;
pub mod error;
pub mod gate;
mod threshold;

pub use actors::{RoleCapabilities, StaticActors};
pub use error::PolicyError;
pub use gate::{approval_capabilities, can_approve, has_capability, require};
pub use threshold::{ApprovalPolicy, ThresholdPolicy};
