// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use serde::{Deserialize, Serialize};

/// Connection parameters of one deployment target. The password is a
/// reference into an external credential store, never the secret itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
	pub name: String,
	#[serde(default = "default_host")]
	pub host: String,
	#[serde(default)]
	pub port: u16,
	pub database: String,
	#[serde(default)]
	pub username: String,
	#[serde(default)]
	pub password_ref: Option<String>,
}

fn default_host() -> String {
	"localhost".to_string()
}

impl EnvironmentConfig {
	pub fn new(name: impl Into<String>, database: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			host: default_host(),
			port: 0,
			database: database.into(),
			username: String::new(),
			password_ref: None,
		}
	}

	pub fn host(mut self, host: impl Into<String>, port: u16) -> Self {
		self.host = host.into();
		self.port = port;
		self
	}

	pub fn credentials(mut self, username: impl Into<String>, password_ref: impl Into<String>) -> Self {
		self.username = username.into();
		self.password_ref = Some(password_ref.into());
		self
	}
}
