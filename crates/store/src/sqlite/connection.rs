// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! SQLite connection utilities.

use rusqlite::{Connection, ErrorCode};
use sluice_type::Error;

use super::{DbPath, OpenFlags, SqliteConfig};
use crate::{Result, error::StoreError};

const SCHEMA: &str = "
	CREATE TABLE IF NOT EXISTS migration_history (
		version      TEXT PRIMARY KEY,
		status       TEXT NOT NULL,
		description  TEXT NOT NULL DEFAULT '',
		risk_level   TEXT NOT NULL,
		applied_at   TEXT,
		execution_ms INTEGER,
		applied_by   TEXT,
		failure      TEXT,
		execution_id TEXT
	);

	CREATE TABLE IF NOT EXISTS migration_approvals (
		version       TEXT NOT NULL,
		approver_role TEXT NOT NULL,
		approver_name TEXT NOT NULL,
		approved_at   TEXT NOT NULL,
		comments      TEXT NOT NULL DEFAULT '',
		PRIMARY KEY (version, approver_role)
	);

	CREATE TABLE IF NOT EXISTS migration_executions (
		execution_id TEXT PRIMARY KEY,
		version      TEXT NOT NULL,
		status       TEXT NOT NULL,
		exit_code    INTEGER,
		failure      TEXT,
		duration_ms  INTEGER NOT NULL,
		executed_by  TEXT NOT NULL,
		executed_at  TEXT NOT NULL,
		forced       INTEGER NOT NULL,
		stdout       TEXT NOT NULL,
		stderr       TEXT NOT NULL
	);

	CREATE INDEX IF NOT EXISTS migration_executions_version ON migration_executions (version);
";

/// Opens a connection, applies the configured pragmas and creates the schema.
pub(super) fn connect(environment: &str, config: &SqliteConfig) -> Result<Connection> {
	let path = resolve_db_path(&config.path);
	let flags = convert_flags(&config.flags);

	let conn = Connection::open_with_flags(path.path(), flags).map_err(|e| unavailable(environment, e))?;

	conn.busy_timeout(config.busy_timeout).map_err(|e| unavailable(environment, e))?;
	conn.pragma_update(None, "journal_mode", config.journal_mode.as_str())
		.map_err(|e| map_error(environment, "pragma", e))?;
	conn.pragma_update(None, "synchronous", config.synchronous_mode.as_str())
		.map_err(|e| map_error(environment, "pragma", e))?;
	conn.execute_batch(SCHEMA).map_err(|e| map_error(environment, "schema", e))?;

	Ok(conn)
}

/// Scratch databases get their directory created. Persistent paths are used
/// as given, so a missing directory surfaces as an unreachable store.
pub(super) fn resolve_db_path(db_path: &DbPath) -> DbPath {
	match db_path {
		DbPath::Tmpfs(path) => {
			if let Some(parent) = path.parent() {
				std::fs::create_dir_all(parent).ok();
			}
			DbPath::Tmpfs(path.clone())
		}
		DbPath::File(path) => DbPath::File(path.clone()),
	}
}

pub(super) fn convert_flags(flags: &OpenFlags) -> rusqlite::OpenFlags {
	let mut rusqlite_flags = rusqlite::OpenFlags::empty();

	if flags.read_write {
		rusqlite_flags |= rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE;
	} else {
		rusqlite_flags |= rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY;
	}
	if flags.create {
		rusqlite_flags |= rusqlite::OpenFlags::SQLITE_OPEN_CREATE;
	}
	if flags.full_mutex {
		rusqlite_flags |= rusqlite::OpenFlags::SQLITE_OPEN_FULL_MUTEX;
	}
	if flags.no_mutex {
		rusqlite_flags |= rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX;
	}
	if flags.uri {
		rusqlite_flags |= rusqlite::OpenFlags::SQLITE_OPEN_URI;
	}

	rusqlite_flags
}

fn unavailable(environment: &str, err: rusqlite::Error) -> Error {
	StoreError::Unavailable {
		environment: environment.to_string(),
		reason: err.to_string(),
	}
	.into()
}

/// Busy, locked and unopenable databases count as unreachable. Everything
/// else is a failed query against a reachable store.
pub(super) fn map_error(environment: &str, operation: &'static str, err: rusqlite::Error) -> Error {
	match err.sqlite_error_code() {
		Some(ErrorCode::CannotOpen | ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked | ErrorCode::NotADatabase) => {
			unavailable(environment, err)
		}
		_ => StoreError::query(operation, err).into(),
	}
}
