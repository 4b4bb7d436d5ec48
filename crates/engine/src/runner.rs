// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! External migration runner as a bounded subprocess.

#[cfg(unix)]
use std::os::unix::process::CommandExt;
use std::{
	io::Read,
	path::{Path, PathBuf},
	process::{Child, Command, Stdio},
	sync::mpsc,
	thread,
	time::{Duration, Instant},
};

use sluice_core::interface::{RunExit, RunOutput, Runner, RunnerInvocation};
use sluice_type::Result;
use tracing::{debug, instrument, warn};

use crate::error::ExecuteError;

pub const VERSION_ENV: &str = "SLUICE_MIGRATION_VERSION";

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const OUTPUT_GRACE: Duration = Duration::from_secs(1);

/// Runs `<program> [args..] migrate <environment> [--force]`, polling the
/// child until it exits or the timeout expires. On unix the child leads its
/// own process group, and expiry kills the whole group so nothing the runner
/// started outlives the recorded timeout.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
	program: PathBuf,
	args: Vec<String>,
	poll_interval: Duration,
}

impl ProcessRunner {
	pub fn new(program: impl Into<PathBuf>) -> Self {
		Self {
			program: program.into(),
			args: vec![],
			poll_interval: POLL_INTERVAL,
		}
	}

	/// Arguments placed before the invocation's own, e.g. a script for an
	/// interpreter.
	pub fn with_args<I, S>(mut self, args: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.args = args.into_iter().map(Into::into).collect();
		self
	}

	pub fn program(&self) -> &Path {
		&self.program
	}
}

impl Runner for ProcessRunner {
	#[instrument(name = "engine::runner::run", level = "info", skip(self, invocation), fields(
		program = %self.program.display(),
		version = %invocation.version,
		environment = %invocation.environment,
		force = invocation.force
	))]
	fn run(&self, invocation: &RunnerInvocation, timeout: Duration) -> Result<RunOutput> {
		let start = Instant::now();

		let mut command = Command::new(&self.program);
		command
			.args(&self.args)
			.args(invocation.args())
			.env(VERSION_ENV, invocation.version.as_str())
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped());
		#[cfg(unix)]
		command.process_group(0);

		let mut child = command.spawn().map_err(|e| ExecuteError::SpawnFailed {
			program: self.program.display().to_string(),
			reason: e.to_string(),
		})?;

		let stdout = capture(child.stdout.take());
		let stderr = capture(child.stderr.take());

		let exit = wait_bounded(&mut child, timeout, self.poll_interval);
		let duration = start.elapsed();

		let deadline = Instant::now() + OUTPUT_GRACE;
		let output = RunOutput {
			exit,
			stdout: collect(stdout, deadline),
			stderr: collect(stderr, deadline),
			duration,
		};
		debug!(exit = ?output.exit, duration_ms = duration.as_millis() as u64, "runner finished");
		Ok(output)
	}
}

fn wait_bounded(child: &mut Child, timeout: Duration, poll_interval: Duration) -> RunExit {
	let start = Instant::now();
	loop {
		match child.try_wait() {
			Ok(Some(status)) => return RunExit::Exited(status.code()),
			Ok(None) => {
				if start.elapsed() >= timeout {
					warn!(timeout_secs = timeout.as_secs(), "runner timed out, killing");
					kill(child);
					return RunExit::TimedOut;
				}
				thread::sleep(poll_interval.min(timeout.saturating_sub(start.elapsed())).max(Duration::from_millis(1)));
			}
			Err(e) => {
				warn!(error = %e, "cannot poll runner, killing");
				kill(child);
				return RunExit::Exited(None);
			}
		}
	}
}

/// Kills the runner's process group, then reaps the runner itself.
#[cfg(unix)]
fn kill(child: &mut Child) {
	// The group id equals the child's pid because of `process_group(0)`.
	let pgid = child.id() as libc::pid_t;
	if unsafe { libc::killpg(pgid, libc::SIGKILL) } != 0 {
		warn!(pgid, error = %std::io::Error::last_os_error(), "cannot kill runner process group");
		let _ = child.kill();
	}
	let _ = child.wait();
}

#[cfg(not(unix))]
fn kill(child: &mut Child) {
	let _ = child.kill();
	let _ = child.wait();
}

/// Drains the pipe on its own thread so a chatty child never blocks on a
/// full pipe buffer.
fn capture<R: Read + Send + 'static>(pipe: Option<R>) -> Option<mpsc::Receiver<Vec<u8>>> {
	let mut pipe = pipe?;
	let (tx, rx) = mpsc::channel();
	thread::spawn(move || {
		let mut buf = Vec::new();
		let _ = pipe.read_to_end(&mut buf);
		let _ = tx.send(buf);
	});
	Some(rx)
}

/// Processes that left the runner's group may keep a pipe open, so both
/// pipes share one bounded deadline.
fn collect(rx: Option<mpsc::Receiver<Vec<u8>>>, deadline: Instant) -> String {
	rx.and_then(|rx| rx.recv_timeout(deadline.saturating_duration_since(Instant::now())).ok())
		.map(|buf| String::from_utf8_lossy(&buf).into_owned())
		.unwrap_or_default()
}

#[cfg(all(test, unix))]
mod tests {
	use std::fs;

	use sluice_testing::tempdir::TempDir;
	use sluice_type::Version;

	use super::*;

	fn script(dir: &TempDir, body: &str) -> ProcessRunner {
		let path = dir.path().join("migrate.sh");
		fs::write(&path, format!("{}\n", body)).unwrap();
		ProcessRunner::new("/bin/sh").with_args([path.display().to_string()])
	}

	fn invocation(force: bool) -> RunnerInvocation {
		RunnerInvocation {
			environment: "staging".to_string(),
			version: Version::from("2024_01_add_users"),
			force,
		}
	}

	#[test]
	fn test_passes_arguments_and_version() {
		let dir = TempDir::new().unwrap();
		let runner = script(&dir, "echo \"$1 $2 $3 $SLUICE_MIGRATION_VERSION\"\necho warn >&2");

		let output = runner.run(&invocation(true), Duration::from_secs(10)).unwrap();
		assert!(output.succeeded());
		assert_eq!(output.stdout.trim(), "migrate staging --force 2024_01_add_users");
		assert_eq!(output.stderr.trim(), "warn");
	}

	#[test]
	fn test_nonzero_exit() {
		let dir = TempDir::new().unwrap();
		let runner = script(&dir, "echo 'relation exists' >&2\nexit 3");

		let output = runner.run(&invocation(false), Duration::from_secs(10)).unwrap();
		assert_eq!(output.exit, RunExit::Exited(Some(3)));
		assert_eq!(output.stderr.trim(), "relation exists");
	}

	#[test]
	fn test_timeout_kills_child() {
		let dir = TempDir::new().unwrap();
		let runner = script(&dir, "exec sleep 30");

		let start = Instant::now();
		let output = runner.run(&invocation(false), Duration::from_millis(200)).unwrap();
		assert_eq!(output.exit, RunExit::TimedOut);
		assert!(start.elapsed() < Duration::from_secs(10));
	}

	#[test]
	fn test_timeout_kills_started_processes() {
		let dir = TempDir::new().unwrap();
		let marker = dir.path().join("applied");
		let runner = script(&dir, &format!("sh -c 'sleep 2; touch {}'\necho done", marker.display()));

		let start = Instant::now();
		let output = runner.run(&invocation(false), Duration::from_millis(200)).unwrap();
		assert_eq!(output.exit, RunExit::TimedOut);
		assert!(start.elapsed() < Duration::from_millis(1500), "returned after {:?}", start.elapsed());

		thread::sleep(Duration::from_secs(3));
		assert!(!marker.exists());
	}

	#[test]
	fn test_missing_program() {
		let runner = ProcessRunner::new("/nonexistent/sluice/migrate.sh");
		let err = runner.run(&invocation(false), Duration::from_secs(1)).unwrap_err();
		assert_eq!(err.code(), "EXEC_004");
	}
}
