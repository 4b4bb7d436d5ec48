// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{fs, path::Path};

use sluice_core::model::Actor;
use sluice_engine::{ConfigError, Sluice, SluiceConfig};
use sluice_type::{Result, Version};
use tracing::{debug, warn};

use crate::{Cli, Command, render::Output};

pub(crate) fn run(cli: &Cli) -> Result<()> {
	let config = load_config(&cli.config)?;
	let sluice = Sluice::builder(config).build()?;
	let out = Output::new(cli.json);

	match &cli.command {
		Command::Status {
			environment,
		} => out.status(&sluice.status(environment)?),
		Command::Pending {
			environment,
		} => out.pending(environment, &sluice.pending_migrations(environment)?),
		Command::Show {
			environment,
			version,
		} => out.detail(&sluice.migration_detail(environment, &Version::from(version.as_str()))?),
		Command::Approve {
			environment,
			version,
			comments,
		} => {
			let actor = actor(&sluice, cli.user.as_deref())?;
			out.approval(&sluice.add_approval(environment, &actor, &Version::from(version.as_str()), comments)?)
		}
		Command::Execute {
			environment,
			version,
			force,
		} => {
			let actor = actor(&sluice, cli.user.as_deref())?;
			let report = sluice.execute_migration(environment, &actor, &Version::from(version.as_str()), *force)?;
			out.execution(&report)?;

			if !report.record_written {
				warn!(execution_id = %report.execution_id, "history store does not reflect this execution");
			}
			match report.error() {
				Some(err) => Err(err),
				None => Ok(()),
			}
		}
		Command::MarkPending {
			environment,
			version,
		} => {
			let actor = actor(&sluice, cli.user.as_deref())?;
			out.record(&sluice.mark_pending(environment, &actor, &Version::from(version.as_str()))?)
		}
		Command::MarkRolledBack {
			environment,
			version,
		} => {
			let actor = actor(&sluice, cli.user.as_deref())?;
			out.record(&sluice.mark_rolled_back(environment, &actor, &Version::from(version.as_str()))?)
		}
	}
}

fn load_config(path: &Path) -> Result<SluiceConfig> {
	let text = fs::read_to_string(path).map_err(|e| ConfigError::Invalid {
		reason: format!("cannot read {}: {}", path.display(), e),
	})?;

	let config: SluiceConfig = serde_json::from_str(&text).map_err(|e| ConfigError::Invalid {
		reason: format!("{}: {}", path.display(), e),
	})?;

	debug!(path = %path.display(), environments = config.environments.len(), actors = config.actors.len(), "configuration loaded");
	Ok(config)
}

fn actor(sluice: &Sluice, username: Option<&str>) -> Result<Actor> {
	let username = username.ok_or_else(|| ConfigError::Invalid {
		reason: "no acting user, pass --user or set SLUICE_USER".to_string(),
	})?;
	sluice.resolve_actor(username)
}
