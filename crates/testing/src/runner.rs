// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use sluice_core::interface::{RunExit, RunOutput, Runner, RunnerInvocation};
use sluice_type::{Error, Result, error::diagnostic::execute::spawn_failed};

#[derive(Debug, Clone)]
enum Script {
	Exit(i32),
	Timeout,
	SpawnFailure,
}

#[derive(Debug, Default)]
struct Gate {
	held: bool,
}

/// Scripted [`Runner`]. Records every invocation and can hold callers at
/// the start of `run` until released.
#[derive(Debug)]
pub struct FakeRunner {
	script: Script,
	stdout: String,
	stderr: String,
	invocations: Mutex<Vec<RunnerInvocation>>,
	entered: Condvar,
	gate: Mutex<Gate>,
	released: Condvar,
}

impl FakeRunner {
	fn scripted(script: Script) -> Self {
		Self {
			script,
			stdout: String::new(),
			stderr: String::new(),
			invocations: Mutex::new(Vec::new()),
			entered: Condvar::new(),
			gate: Mutex::new(Gate::default()),
			released: Condvar::new(),
		}
	}

	pub fn succeeding() -> Self {
		Self::scripted(Script::Exit(0))
	}

	pub fn exiting(code: i32) -> Self {
		Self::scripted(Script::Exit(code))
	}

	pub fn timing_out() -> Self {
		Self::scripted(Script::Timeout)
	}

	pub fn failing_to_spawn() -> Self {
		Self::scripted(Script::SpawnFailure)
	}

	pub fn with_stdout(mut self, stdout: &str) -> Self {
		self.stdout = stdout.to_string();
		self
	}

	pub fn with_stderr(mut self, stderr: &str) -> Self {
		self.stderr = stderr.to_string();
		self
	}

	/// Blocks every subsequent `run` until [`FakeRunner::release`].
	pub fn hold(self) -> Self {
		self.gate.lock().held = true;
		self
	}

	pub fn release(&self) {
		self.gate.lock().held = false;
		self.released.notify_all();
	}

	pub fn invocations(&self) -> Vec<RunnerInvocation> {
		self.invocations.lock().clone()
	}

	pub fn invocation_count(&self) -> usize {
		self.invocations.lock().len()
	}

	/// Waits until at least `count` calls reached the runner.
	pub fn wait_for_invocations(&self, count: usize, timeout: Duration) -> bool {
		let deadline = Instant::now() + timeout;
		let mut invocations = self.invocations.lock();
		while invocations.len() < count {
			if self.entered.wait_until(&mut invocations, deadline).timed_out() {
				return invocations.len() >= count;
			}
		}
		true
	}
}

impl Runner for FakeRunner {
	fn run(&self, invocation: &RunnerInvocation, timeout: Duration) -> Result<RunOutput> {
		let (exit, duration) = match self.script {
			Script::Exit(code) => (RunExit::Exited(Some(code)), Duration::from_millis(5)),
			Script::Timeout => (RunExit::TimedOut, timeout),
			Script::SpawnFailure => return Err(Error(spawn_failed("fake-runner", "scripted spawn failure"))),
		};

		{
			let mut invocations = self.invocations.lock();
			invocations.push(invocation.clone());
			self.entered.notify_all();
		}

		let mut gate = self.gate.lock();
		while gate.held {
			self.released.wait(&mut gate);
		}
		drop(gate);

		Ok(RunOutput {
			exit,
			stdout: self.stdout.clone(),
			stderr: self.stderr.clone(),
			duration,
		})
	}
}
