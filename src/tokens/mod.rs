// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Access Tokens
//!
//! Issue and verify short-lived, owner-bound access tokens.
//!
//! ## Lifecycle
//!
//! 1. An authenticated principal asks for a token with an expiry at most
//!    three days away.
//! 2. A 6-symbol `A-Z0-9` value is drawn from the process CSPRNG and stored
//!    with the owner and expiry. A value still held by an unexpired record
//!    is redrawn (bounded).
//! 3. The owner presents the value; it is valid while a record with that
//!    exact value and owner has not passed its expiry. Verification never
//!    consumes or mutates the record.

pub mod error;
pub mod generator;
pub mod service;

pub use error::TokenError;
pub use generator::{TokenGenerator, TOKEN_ALPHABET, TOKEN_LENGTH};
pub use service::{IssuedToken, TokenService, ValidToken, MAX_ISSUE_ATTEMPTS, MAX_TOKEN_LIFETIME};
