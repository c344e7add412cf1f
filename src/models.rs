// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Persisted records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A short-lived access token bound to the principal that requested it.
///
/// Records are immutable once written. Expiry is enforced when the token is
/// presented, not by eviction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessToken {
    /// Surrogate identifier. Never returned to clients.
    pub id: Uuid,
    /// Six symbols from `A-Z0-9`.
    pub token: String,
    /// Instant after which the token is no longer valid.
    pub expiry: DateTime<Utc>,
    /// User ID of the principal the token was issued to.
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

impl AccessToken {
    /// Build a fresh record for `owner_id`.
    pub fn new(
        token: String,
        owner_id: impl Into<String>,
        expiry: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            token,
            expiry,
            owner_id: owner_id.into(),
            created_at,
        }
    }

    /// Whether the token is past its expiry at `now`.
    ///
    /// A token whose expiry equals `now` is still valid.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry < now
    }
}

/// A principal known to the service.
///
/// Registered and removed at runtime through the admin principal endpoints
/// (or `SEED_PRINCIPALS` at startup). Only known principals may be issued
/// tokens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct Principal {
    /// Canonical user ID (session JWT `sub` claim)
    pub user_id: String,
    pub registered_at: DateTime<Utc>,
}
