// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sluice_catalog::parse_metadata;
use sluice_type::RiskLevel;

#[derive(Arbitrary, Debug)]
struct Input {
	version: String,
	text: String,
}

fuzz_target!(|input: Input| {
	let parsed = parse_metadata(input.version.as_str(), &input.text);

	assert_eq!(parsed.descriptor.version.as_str(), input.version);
	if parsed.descriptor.risk_level != RiskLevel::Low {
		assert!(input.text.to_ascii_lowercase().contains("risk level"));
	}
});
