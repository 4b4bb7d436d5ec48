// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use sluice_core::model::MigrationDescriptor;
use sluice_type::{RiskLevel, Version};

use crate::error::CatalogError;

const DESCRIPTION: &str = "Description:";
const RISK_LEVEL: &str = "Risk Level:";
const ESTIMATED_DURATION: &str = "Estimated Duration:";
const AUTHOR: &str = "Author:";
const CREATED: &str = "Created:";

/// Result of reading one migration's header. `malformed` lists the fields
/// that fell back to their defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMetadata {
	pub descriptor: MigrationDescriptor,
	pub malformed: Vec<CatalogError>,
}

/// Extracts the metadata header of a migration file.
pub fn parse_metadata(version: impl Into<Version>, text: &str) -> ParsedMetadata {
	let mut descriptor = MigrationDescriptor::new(version);
	let mut malformed = Vec::new();

	let text = text.strip_prefix('\u{feff}').unwrap_or(text);

	for line in text.lines() {
		let Some(comment) = line.trim_start().strip_prefix("--") else {
			break;
		};
		let comment = comment.trim();

		if let Some(value) = comment.strip_prefix(DESCRIPTION) {
			descriptor.description = value.trim().to_string();
		} else if let Some(value) = comment.strip_prefix(RISK_LEVEL) {
			let value = value.trim();
			match value.parse::<RiskLevel>() {
				Ok(risk) => descriptor.risk_level = risk,
				Err(_) => {
					descriptor.risk_level = RiskLevel::Low;
					malformed.push(CatalogError::MalformedMetadata {
						version: descriptor.version.to_string(),
						field: "Risk Level",
						value: value.to_string(),
					});
				}
			}
		} else if let Some(value) = comment.strip_prefix(ESTIMATED_DURATION) {
			descriptor.estimated_duration = value.trim().to_string();
		} else if let Some(value) = comment.strip_prefix(AUTHOR) {
			descriptor.author = value.trim().to_string();
		} else if let Some(value) = comment.strip_prefix(CREATED) {
			descriptor.created = value.trim().to_string();
		}
	}

	ParsedMetadata {
		descriptor,
		malformed,
	}
}
