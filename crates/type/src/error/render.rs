// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::Write;

use super::Diagnostic;

/// Renders a diagnostic as plain text for terminals and logs.
pub struct DefaultRenderer;

impl DefaultRenderer {
	pub fn render_string(diagnostic: &Diagnostic) -> String {
		let mut out = String::new();
		Self::render(&mut out, diagnostic, 0);
		out
	}

	fn render(out: &mut String, diagnostic: &Diagnostic, depth: usize) {
		let indent = "  ".repeat(depth);

		let _ = writeln!(out, "{}Error {}", indent, diagnostic.code);
		let _ = writeln!(out, "{}  {}", indent, diagnostic.message);

		if let Some(label) = &diagnostic.label {
			let _ = writeln!(out, "{}  --> {}", indent, label);
		}

		if let Some(help) = &diagnostic.help {
			let _ = writeln!(out, "{}help: {}", indent, help);
		}

		for note in &diagnostic.notes {
			let _ = writeln!(out, "{}note: {}", indent, note);
		}

		if let Some(cause) = &diagnostic.cause {
			let _ = writeln!(out, "{}caused by:", indent);
			Self::render(out, cause, depth + 1);
		}
	}
}
