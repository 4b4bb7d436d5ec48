// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	env, fs,
	path::{Path, PathBuf},
};

use uuid::Uuid;

pub fn temp_dir<F>(f: F) -> std::io::Result<()>
where
	F: FnOnce(&Path) -> std::io::Result<()>,
{
	let dir = TempDir::new()?;
	f(dir.path())
}

/// Uniquely named directory under the system temp dir, removed on drop.
#[derive(Debug)]
pub struct TempDir {
	path: PathBuf,
}

impl TempDir {
	pub fn new() -> std::io::Result<Self> {
		let mut path = env::temp_dir();
		path.push(format!("sluice-{}", Uuid::new_v4()));
		fs::create_dir(&path)?;
		Ok(Self {
			path,
		})
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

impl Drop for TempDir {
	fn drop(&mut self) {
		let _ = fs::remove_dir_all(&self.path);
	}
}
