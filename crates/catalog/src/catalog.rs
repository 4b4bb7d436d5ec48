// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	collections::BTreeSet,
	fs,
	io::ErrorKind,
	path::{Path, PathBuf},
};

use sluice_core::model::MigrationDescriptor;
use sluice_type::{Error, Version};
use tracing::{debug, instrument, warn};

use crate::{error::CatalogError, metadata::parse_metadata};

const EXTENSION: &str = "sql";

/// Directory of `<version>.sql` migration files.
#[derive(Debug, Clone)]
pub struct MigrationCatalog {
	dir: PathBuf,
}

impl MigrationCatalog {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self {
			dir: dir.into(),
		}
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	/// Every readable migration, ordered by filename.
	#[instrument(name = "catalog::scan", level = "debug", skip(self), fields(dir = %self.dir.display()))]
	pub fn scan(&self) -> crate::Result<Vec<MigrationDescriptor>> {
		let entries = match fs::read_dir(&self.dir) {
			Ok(entries) => entries,
			Err(e) if e.kind() == ErrorKind::NotFound => {
				debug!("migrations directory does not exist");
				return Ok(vec![]);
			}
			Err(e) => {
				return Err(CatalogError::Unreadable {
					path: self.dir.display().to_string(),
					reason: e.to_string(),
				}
				.into());
			}
		};

		let mut files: Vec<(String, PathBuf)> = Vec::new();
		for entry in entries {
			let entry = match entry {
				Ok(entry) => entry,
				Err(e) => {
					warn!(error = %e, "skipping unreadable directory entry");
					continue;
				}
			};

			let path = entry.path();
			if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
				continue;
			}

			let Some(file_name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
				warn!(path = %path.display(), "skipping migration with a non UTF-8 file name");
				continue;
			};

			files.push((file_name, path));
		}

		files.sort_by(|a, b| a.0.cmp(&b.0));

		let mut result = Vec::with_capacity(files.len());
		for (_, path) in files {
			match read_descriptor(&path) {
				Ok(descriptor) => result.push(descriptor),
				Err(e) => warn!(path = %path.display(), error = %e, "skipping migration file"),
			}
		}

		Ok(result)
	}

	/// Migrations whose version is not in `applied`, ordered by filename.
	#[instrument(name = "catalog::pending", level = "debug", skip(self, applied), fields(applied = applied.len()))]
	pub fn pending(&self, applied: &BTreeSet<Version>) -> crate::Result<Vec<MigrationDescriptor>> {
		Ok(self.scan()?.into_iter().filter(|d| !applied.contains(&d.version)).collect())
	}

	/// The descriptor of one version, or `None` if no such file exists.
	#[instrument(name = "catalog::find", level = "debug", skip(self))]
	pub fn find(&self, version: &Version) -> crate::Result<Option<MigrationDescriptor>> {
		let name = version.as_str();
		if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
			return Ok(None);
		}

		let path = self.dir.join(format!("{}.{}", name, EXTENSION));
		if !path.is_file() {
			return Ok(None);
		}

		read_descriptor(&path).map(Some)
	}
}

fn read_descriptor(path: &Path) -> Result<MigrationDescriptor, Error> {
	let version = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default().to_string();

	let text = fs::read_to_string(path).map_err(|e| CatalogError::Unreadable {
		path: path.display().to_string(),
		reason: e.to_string(),
	})?;

	let parsed = parse_metadata(version, &text);
	for malformed in &parsed.malformed {
		warn!(path = %path.display(), "{}", malformed);
	}

	Ok(parsed.descriptor)
}
