// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::{BTreeMap, BTreeSet, HashMap};

use sluice_core::{
	interface::ActorDirectory,
	model::{Actor, Capability, Role},
};

/// Capability sets granted per role.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoleCapabilities {
	roles: BTreeMap<Role, BTreeSet<Capability>>,
}

impl RoleCapabilities {
	pub fn standard() -> Self {
		use Capability::*;

		Self::default()
			.with_role(Role::Developer, [ViewOwn, CreateMigrations])
			.with_role(Role::SeniorDeveloper, [ViewAll, CreateMigrations, ApproveHighRisk])
			.with_role(Role::DataOpsLead, [ViewAll, ApproveHighRisk, ManageLocks])
			.with_role(Role::Dba, [ViewAll, ApproveAll, ManageLocks])
			.with_role(Role::Admin, Capability::ALL)
	}

	/// Replaces the capability set of `role`.
	pub fn with_role(mut self, role: Role, capabilities: impl IntoIterator<Item = Capability>) -> Self {
		self.roles.insert(role, capabilities.into_iter().collect());
		self
	}

	/// Roles without an entry get no capabilities.
	pub fn capabilities(&self, role: &Role) -> BTreeSet<Capability> {
		self.roles.get(role).cloned().unwrap_or_default()
	}

	pub fn actor(&self, username: impl Into<String>, role: Role) -> Actor {
		let permissions = self.capabilities(&role);
		Actor::new(username, role, permissions)
	}
}

/// Fixed username to actor mapping.
#[derive(Debug, Clone, Default)]
pub struct StaticActors {
	actors: HashMap<String, Actor>,
}

impl StaticActors {
	pub fn new(actors: impl IntoIterator<Item = Actor>) -> Self {
		Self {
			actors: actors.into_iter().map(|a| (a.username.clone(), a)).collect(),
		}
	}

	pub fn insert(&mut self, actor: Actor) {
		self.actors.insert(actor.username.clone(), actor);
	}

	pub fn len(&self) -> usize {
		self.actors.len()
	}

	pub fn is_empty(&self) -> bool {
		self.actors.is_empty()
	}
}

impl ActorDirectory for StaticActors {
	fn resolve(&self, username: &str) -> Option<Actor> {
		self.actors.get(username).cloned()
	}
}
