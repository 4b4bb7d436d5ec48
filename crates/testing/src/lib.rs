// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Fixtures and fakes shared by the workspace's tests.

pub mod catalog;
pub mod notify;
pub mod runner;
pub mod store;
pub mod tempdir;
