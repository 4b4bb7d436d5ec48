// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::time::Duration;

use sluice_type::{Result, Version};

/// Arguments of one runner call: `<runner> migrate <environment> [--force]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerInvocation {
	pub environment: String,
	pub version: Version,
	pub force: bool,
}

impl RunnerInvocation {
	pub fn args(&self) -> Vec<String> {
		let mut args = vec!["migrate".to_string(), self.environment.clone()];
		if self.force {
			args.push("--force".to_string());
		}
		args
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunExit {
	/// The process exited on its own. `None` when it was killed by a signal.
	Exited(Option<i32>),
	/// The wall-clock bound expired and the process was killed.
	TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
	pub exit: RunExit,
	pub stdout: String,
	pub stderr: String,
	pub duration: Duration,
}

impl RunOutput {
	pub fn succeeded(&self) -> bool {
		matches!(self.exit, RunExit::Exited(Some(0)))
	}

	pub fn exit_code(&self) -> Option<i32> {
		match self.exit {
			RunExit::Exited(code) => code,
			RunExit::TimedOut => None,
		}
	}
}

/// Runs a migration, returning its exit status and captured output. Must not
/// block longer than `timeout`. An `Err` means the runner never started.
pub trait Runner: Send + Sync {
	fn run(&self, invocation: &RunnerInvocation, timeout: Duration) -> Result<RunOutput>;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_args_without_force() {
		let invocation = RunnerInvocation {
			environment: "staging".to_string(),
			version: Version::from("2024_01_add_users"),
			force: false,
		};
		assert_eq!(invocation.args(), vec!["migrate", "staging"]);
	}

	#[test]
	fn test_args_with_force() {
		let invocation = RunnerInvocation {
			environment: "production".to_string(),
			version: Version::from("2024_01_add_users"),
			force: true,
		};
		assert_eq!(invocation.args(), vec!["migrate", "production", "--force"]);
	}

	#[test]
	fn test_timeout_is_not_success() {
		let output = RunOutput {
			exit: RunExit::TimedOut,
			stdout: String::new(),
			stderr: String::new(),
			duration: Duration::from_secs(300),
		};
		assert!(!output.succeeded());
		assert_eq!(output.exit_code(), None);
	}
}
