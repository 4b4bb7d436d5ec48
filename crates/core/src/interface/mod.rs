// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Narrow interfaces to the collaborators the workflow depends on.

pub mod actor;
pub mod environment;
pub mod notify;
pub mod runner;
pub mod store;

pub use actor::ActorDirectory;
pub use environment::EnvironmentProvider;
pub use notify::Notifier;
pub use runner::{RunExit, RunOutput, Runner, RunnerInvocation};
pub use store::{HistoryConnector, HistoryStore};
