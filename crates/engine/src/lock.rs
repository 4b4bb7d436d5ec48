// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::HashSet;

use parking_lot::Mutex;
use sluice_type::Version;

/// In-process mutual exclusion per `(version, environment)`. Not shared
/// across processes.
#[derive(Debug, Default)]
pub struct ExecutionLocks {
	held: Mutex<HashSet<(Version, String)>>,
}

impl ExecutionLocks {
	pub fn new() -> Self {
		Self::default()
	}

	/// `None` when another execution holds the pair.
	pub fn try_acquire(&self, version: &Version, environment: &str) -> Option<ExecutionGuard<'_>> {
		let key = (version.clone(), environment.to_string());
		if !self.held.lock().insert(key.clone()) {
			return None;
		}

		Some(ExecutionGuard {
			locks: self,
			key,
		})
	}
}

#[derive(Debug)]
pub struct ExecutionGuard<'a> {
	locks: &'a ExecutionLocks,
	key: (Version, String),
}

impl Drop for ExecutionGuard<'_> {
	fn drop(&mut self) {
		self.locks.held.lock().remove(&self.key);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_exclusive_per_pair() {
		let locks = ExecutionLocks::new();
		let v1 = Version::from("v1");

		let guard = locks.try_acquire(&v1, "staging").unwrap();
		assert!(locks.try_acquire(&v1, "staging").is_none());
		assert!(locks.try_acquire(&v1, "production").is_some());
		assert!(locks.try_acquire(&Version::from("v2"), "staging").is_some());

		drop(guard);
		assert!(locks.try_acquire(&v1, "staging").is_some());
	}
}
