// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Reads versioned migration files and their metadata headers.
//!
//! Each `<version>.sql` file may start with comment lines such as
//!
//! ```text
//! -- Description: Drop the legacy email column
//! -- Risk Level: HIGH
//! -- Estimated Duration: 5 minutes
//! -- Author: alice
//! -- Created: 2024-02-01
//! ```
//!
//! Scanning stops at the first line that is not a comment.

mod catalog;
pub mod error;
mod metadata;

pub use catalog::MigrationCatalog;
pub use error::CatalogError;
pub use metadata::{ParsedMetadata, parse_metadata};

pub type Result<T> = std::result::Result<T, sluice_type::Error>;
