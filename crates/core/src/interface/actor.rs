// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::model::Actor;

/// Resolves usernames to actors. Backed by whatever identity provider the
/// deployment uses.
pub trait ActorDirectory: Send + Sync {
	fn resolve(&self, username: &str) -> Option<Actor>;
}
