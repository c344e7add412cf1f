// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Resolves the caller's identity from a session JWT. Session tokens are
//! minted by the sign-in service; this crate only verifies them.
//!
//! ## Auth Flow
//!
//! 1. Client signs in elsewhere and receives an HS256 session JWT
//! 2. Client sends `Authorization: Bearer <JWT>`
//! 3. Token server:
//!    - Verifies signature (shared secret), expiry, and issuer/audience
//!      when configured
//!    - Extracts `sub` → canonical `user_id`, which becomes the owner of
//!      any access token issued or verified in that request
//!
//! ## Security
//!
//! - All `/v1` endpoints require authentication
//! - Principal management additionally requires `role: "admin"`
//! - Clock skew tolerance is 60 seconds

pub mod claims;
pub mod config;
pub mod error;
pub mod extractor;

pub use claims::{AuthenticatedUser, SessionClaims, ADMIN_ROLE};
pub use config::AuthConfig;
pub use error::AuthError;
pub use extractor::{AdminOnly, Auth};
