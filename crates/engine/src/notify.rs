// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use sluice_core::interface::Notifier;
use sluice_type::Result;
use tracing::info;

/// Writes notifications to the log instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
	fn notify_chat(&self, message: &str, channel: &str) -> Result<()> {
		info!(target: "sluice::notify", channel, "{}", message);
		Ok(())
	}

	fn notify_email(&self, recipients: &[String], subject: &str, body: &str) -> Result<()> {
		info!(target: "sluice::notify", recipients = %recipients.join(", "), subject, "{}", body);
		Ok(())
	}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
	fn notify_chat(&self, _message: &str, _channel: &str) -> Result<()> {
		Ok(())
	}

	fn notify_email(&self, _recipients: &[String], _subject: &str, _body: &str) -> Result<()> {
		Ok(())
	}
}
