// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational Token Server - Short-lived Access Token Service
//!
//! Issues six-character access tokens bound to the user that requested them,
//! valid for at most three days, and verifies presented tokens against
//! ownership and expiry.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Session JWT authentication
//! - `config` - Environment configuration
//! - `storage` - Embedded token database (redb) and expired-token sweeper
//! - `tokens` - Token generation, issuance and verification

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
pub mod tokens;
