// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use sluice_type::Result;

/// Outbound notifications. Callers treat both channels as fire-and-forget:
/// an error is logged and never surfaces to the approve/execute caller.
pub trait Notifier: Send + Sync {
	fn notify_chat(&self, message: &str, channel: &str) -> Result<()>;

	fn notify_email(&self, recipients: &[String], subject: &str, body: &str) -> Result<()>;
}
