// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Token Storage
//!
//! Access tokens and the principal directory live in a single redb file
//! (`<DATA_DIR>/tokens.redb`). Every issue is one write transaction and
//! every verification one read transaction; redb serialises writers, so
//! the service holds no locks of its own.
//!
//! Records are never updated. Expired rows stay until the optional
//! [`ExpiredTokenSweeper`] removes them.

pub mod sweeper;
pub mod token_database;

pub use sweeper::ExpiredTokenSweeper;
pub use token_database::{StoreError, StoreResult, TokenDatabase};

/// File name of the database inside the data directory.
pub const DATABASE_FILE: &str = "tokens.redb";
