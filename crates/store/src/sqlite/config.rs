// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Configuration of one environment's SQLite history database.

use std::{
	path::{Path, PathBuf},
	time::Duration,
};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Location of the database file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "path")]
pub enum DbPath {
	/// Persistent database file. The parent directory must exist.
	File(PathBuf),
	/// Scratch file removed when the connector is dropped.
	Tmpfs(PathBuf),
}

impl DbPath {
	pub fn path(&self) -> &Path {
		match self {
			DbPath::File(path) | DbPath::Tmpfs(path) => path,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenFlags {
	pub read_write: bool,
	pub create: bool,
	pub full_mutex: bool,
	pub no_mutex: bool,
	pub uri: bool,
}

impl Default for OpenFlags {
	fn default() -> Self {
		Self {
			read_write: true,
			create: true,
			full_mutex: false,
			no_mutex: true,
			uri: false,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JournalMode {
	Delete,
	Truncate,
	Persist,
	Memory,
	#[default]
	Wal,
	Off,
}

impl JournalMode {
	pub fn as_str(&self) -> &'static str {
		match self {
			JournalMode::Delete => "DELETE",
			JournalMode::Truncate => "TRUNCATE",
			JournalMode::Persist => "PERSIST",
			JournalMode::Memory => "MEMORY",
			JournalMode::Wal => "WAL",
			JournalMode::Off => "OFF",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SynchronousMode {
	Off,
	#[default]
	Normal,
	Full,
	Extra,
}

impl SynchronousMode {
	pub fn as_str(&self) -> &'static str {
		match self {
			SynchronousMode::Off => "OFF",
			SynchronousMode::Normal => "NORMAL",
			SynchronousMode::Full => "FULL",
			SynchronousMode::Extra => "EXTRA",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqliteConfig {
	pub path: DbPath,
	#[serde(default)]
	pub flags: OpenFlags,
	#[serde(default)]
	pub journal_mode: JournalMode,
	#[serde(default)]
	pub synchronous_mode: SynchronousMode,
	#[serde(default = "default_busy_timeout", with = "millis")]
	pub busy_timeout: Duration,
}

fn default_busy_timeout() -> Duration {
	Duration::from_secs(5)
}

impl SqliteConfig {
	/// Persistent database at `path`.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self {
			path: DbPath::File(path.into()),
			flags: OpenFlags::default(),
			journal_mode: JournalMode::Wal,
			synchronous_mode: SynchronousMode::Normal,
			busy_timeout: default_busy_timeout(),
		}
	}

	/// Scratch database in the system temp directory. Every connection of
	/// the same connector sees the same data.
	pub fn in_memory() -> Self {
		let path = std::env::temp_dir().join("sluice").join(format!("history-{}.db", Uuid::new_v4()));
		Self {
			path: DbPath::Tmpfs(path),
			flags: OpenFlags::default(),
			journal_mode: JournalMode::Memory,
			synchronous_mode: SynchronousMode::Off,
			busy_timeout: default_busy_timeout(),
		}
	}

	pub fn journal_mode(mut self, mode: JournalMode) -> Self {
		self.journal_mode = mode;
		self
	}

	pub fn synchronous_mode(mut self, mode: SynchronousMode) -> Self {
		self.synchronous_mode = mode;
		self
	}

	pub fn busy_timeout(mut self, timeout: Duration) -> Self {
		self.busy_timeout = timeout;
		self
	}
}

mod millis {
	use std::time::Duration;

	use serde::{Deserialize, Deserializer, Serializer};

	pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_u64(value.as_millis() as u64)
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
		Ok(Duration::from_millis(u64::deserialize(deserializer)?))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_in_memory_paths_are_unique() {
		let a = SqliteConfig::in_memory();
		let b = SqliteConfig::in_memory();
		assert_ne!(a.path, b.path);
		assert!(matches!(a.path, DbPath::Tmpfs(_)));
	}

	#[test]
	fn test_builder() {
		let config = SqliteConfig::new("/var/lib/sluice/staging.db")
			.journal_mode(JournalMode::Delete)
			.synchronous_mode(SynchronousMode::Full)
			.busy_timeout(Duration::from_millis(250));

		assert_eq!(config.path.path(), Path::new("/var/lib/sluice/staging.db"));
		assert_eq!(config.journal_mode.as_str(), "DELETE");
		assert_eq!(config.synchronous_mode.as_str(), "FULL");
		assert_eq!(config.busy_timeout, Duration::from_millis(250));
	}
}
