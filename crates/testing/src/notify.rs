// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use parking_lot::Mutex;
use sluice_core::interface::Notifier;
use sluice_type::{Result, return_internal_error};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
	pub channel: String,
	pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
	pub recipients: Vec<String>,
	pub subject: String,
	pub body: String,
}

/// Keeps every notification for later assertions.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
	chats: Mutex<Vec<ChatMessage>>,
	emails: Mutex<Vec<Email>>,
}

impl RecordingNotifier {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn chats(&self) -> Vec<ChatMessage> {
		self.chats.lock().clone()
	}

	pub fn emails(&self) -> Vec<Email> {
		self.emails.lock().clone()
	}
}

impl Notifier for RecordingNotifier {
	fn notify_chat(&self, message: &str, channel: &str) -> Result<()> {
		self.chats.lock().push(ChatMessage {
			channel: channel.to_string(),
			message: message.to_string(),
		});
		Ok(())
	}

	fn notify_email(&self, recipients: &[String], subject: &str, body: &str) -> Result<()> {
		self.emails.lock().push(Email {
			recipients: recipients.to_vec(),
			subject: subject.to_string(),
			body: body.to_string(),
		});
		Ok(())
	}
}

/// Fails every notification.
#[derive(Debug, Default)]
pub struct FailingNotifier;

impl Notifier for FailingNotifier {
	fn notify_chat(&self, _message: &str, channel: &str) -> Result<()> {
		return_internal_error!("chat channel {} unreachable", channel)
	}

	fn notify_email(&self, recipients: &[String], _subject: &str, _body: &str) -> Result<()> {
		return_internal_error!("mail relay rejected {} recipients", recipients.len())
	}
}
