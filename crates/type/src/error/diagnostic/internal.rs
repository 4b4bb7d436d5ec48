// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::error::diagnostic::Diagnostic;

/// Creates a detailed internal error diagnostic with source location.
pub fn internal_with_context(
	reason: impl Into<String>,
	file: &str,
	line: u32,
	column: u32,
	module_path: &str,
) -> Diagnostic {
	let reason = reason.into();

	let error_id = format!(
		"ERR-{}-{}:{}",
		chrono::Utc::now().timestamp_millis(),
		file.rsplit('/').next().unwrap_or(file).replace(".rs", ""),
		line
	);

	Diagnostic {
		code: "INTERNAL_ERROR".to_string(),
		message: format!("Internal error [{}]: {}", error_id, reason),
		label: Some(format!("Internal invariant violated at {}:{}:{}", file, line, column)),
		help: Some(format!(
			"This is an internal error that should never occur in normal operation.\n\
			 Please file a bug report and include the error id {} and module {}. Version: {}",
			error_id,
			module_path,
			env!("CARGO_PKG_VERSION"),
		)),
		notes: vec![
			"The migration history may not reflect the last operation.".to_string(),
			format!("Error tracking ID: {}", error_id),
		],
		cause: None,
	}
}
