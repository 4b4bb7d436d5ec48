// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Approval workflow and execution dispatcher.
//!
//! A migration moves through `UNKNOWN_NOT_YET_RUN`, `PENDING_APPROVAL` and
//! `APPROVED_SUFFICIENT` before the dispatcher runs it, after which its record
//! is `APPLIED` or `FAILED`. [`Sluice`] ties the catalog, the per-environment
//! history stores, the policy and the runner together.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod lock;
pub mod notify;
pub mod report;
pub mod runner;
mod service;
pub mod workflow;

pub use config::{ActorConfig, NotificationConfig, RunnerConfig, SluiceConfig, StoreConfig};
pub use dispatch::{DispatchSettings, ExecutionDispatcher, ExecutionReport};
pub use error::{ConfigError, ExecuteError};
pub use lock::{ExecutionGuard, ExecutionLocks};
pub use notify::{NoopNotifier, TracingNotifier};
pub use report::{HistoryStatus, MigrationDetail, PendingMigration, StatusReport};
pub use runner::ProcessRunner;
pub use service::{RECENT_LIMIT, Sluice, SluiceBuilder};
pub use workflow::{ApprovalWorkflow, Evaluation, ExecutionDecision, MigrationState, classify};
