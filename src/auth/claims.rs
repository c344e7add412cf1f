// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session JWT claims and authenticated user representation.

use serde::{Deserialize, Serialize};

/// Role claim value granting access to principal management.
pub const ADMIN_ROLE: &str = "admin";

/// Claims read from a session JWT.
///
/// The sign-in service puts the user ID in `sub` and, for operators, sets
/// `role` to `"admin"`. Other claims are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user ID) - the canonical owner identity
    pub sub: String,

    /// Expiration timestamp
    pub exp: i64,

    /// Issued at timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Authenticated caller, resolved once at the transport boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Canonical user ID (`sub` claim)
    pub user_id: String,

    /// Whether the session carries the admin role
    pub is_admin: bool,
}

impl AuthenticatedUser {
    /// Create from verified session claims.
    pub fn from_claims(claims: SessionClaims) -> Self {
        let is_admin = claims
            .role
            .as_deref()
            .is_some_and(|role| role.eq_ignore_ascii_case(ADMIN_ROLE));
        Self {
            user_id: claims.sub,
            is_admin,
        }
    }
}
