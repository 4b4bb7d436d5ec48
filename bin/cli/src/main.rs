// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use sluice_type::error::render::DefaultRenderer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod render;

#[derive(Parser, Debug)]
#[command(name = "sluice", version, about = "Approve and run database migrations per environment", long_about = None)]
struct Cli {
	/// JSON configuration file
	#[arg(short, long, global = true, env = "SLUICE_CONFIG", default_value = "sluice.json")]
	config: PathBuf,

	/// Acting user, resolved against the configured actors
	#[arg(short, long, global = true, env = "SLUICE_USER")]
	user: Option<String>,

	/// Log filter when RUST_LOG is unset
	#[arg(long, global = true, default_value = "warn")]
	log_level: String,

	/// JSON output and JSON logs
	#[arg(long, global = true)]
	json: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Summary, recent migrations and approval queue
	Status {
		environment: String,
	},
	/// Catalog migrations not yet applied
	Pending {
		environment: String,
	},
	/// State, approvals and executions of one migration
	Show {
		environment: String,
		version: String,
	},
	/// Sign off a migration under your role
	Approve {
		environment: String,
		version: String,
		#[arg(short = 'm', long, default_value = "")]
		comments: String,
	},
	/// Run a migration through the configured runner
	Execute {
		environment: String,
		version: String,
		/// Bypass the approval threshold (requires emergency_deploy)
		#[arg(long)]
		force: bool,
	},
	/// Open the approval queue for a migration
	MarkPending {
		environment: String,
		version: String,
	},
	/// Record that an applied migration was reverted
	MarkRolledBack {
		environment: String,
		version: String,
	},
}

fn init_tracing(log_level: &str, json: bool) {
	let filter = EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new(log_level))
		.unwrap_or_else(|_| EnvFilter::new("warn"));

	let registry = tracing_subscriber::registry().with(filter);
	if json {
		registry.with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)).init();
	} else {
		registry.with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr)).init();
	}
}

fn main() -> ExitCode {
	let cli = Cli::parse();
	init_tracing(&cli.log_level, cli.json);

	match commands::run(&cli) {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			if cli.json {
				eprintln!("{}", serde_json::to_string(&err.0).unwrap_or_else(|_| err.message.clone()));
			} else {
				eprint!("{}", DefaultRenderer::render_string(&err));
			}
			ExitCode::FAILURE
		}
	}
}
