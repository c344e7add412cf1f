// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token issuance and verification.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info, warn};

use super::generator::is_well_formed;
use super::{TokenError, TokenGenerator};
use crate::models::AccessToken;
use crate::storage::{StoreError, TokenDatabase};

/// Longest lifetime a token may be issued with (72 hours, inclusive).
pub const MAX_TOKEN_LIFETIME: TimeDelta = TimeDelta::days(3);

/// Draws attempted before giving up on finding an unclaimed token value.
pub const MAX_ISSUE_ATTEMPTS: u32 = 5;

/// A freshly minted token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires: DateTime<Utc>,
}

/// Outcome of a successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidToken {
    pub expires: DateTime<Utc>,
}

/// Issues and verifies access tokens against the token database.
///
/// Holds no mutable state of its own; safe to share behind an `Arc` and call
/// from any number of handlers at once.
pub struct TokenService {
    db: Arc<TokenDatabase>,
    generator: TokenGenerator,
}

impl TokenService {
    pub fn new(db: Arc<TokenDatabase>, generator: TokenGenerator) -> Self {
        Self { db, generator }
    }

    /// Issue a token for `owner_id` expiring at `requested_expiry`.
    pub fn issue(
        &self,
        owner_id: &str,
        requested_expiry: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        self.issue_at(owner_id, requested_expiry, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    ///
    /// Checks run in order and the first failure is returned: owner
    /// present, owner known, expiry in the future, expiry within
    /// [`MAX_TOKEN_LIFETIME`].
    pub fn issue_at(
        &self,
        owner_id: &str,
        requested_expiry: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        let owner_id = require_owner(owner_id)?;

        if self.db.get_principal(owner_id)?.is_none() {
            debug!(owner_id = %owner_id, "Token issue refused: unknown principal");
            return Err(TokenError::PrincipalNotFound);
        }

        if requested_expiry <= now {
            return Err(TokenError::InvalidExpiry);
        }
        if requested_expiry - now > MAX_TOKEN_LIFETIME {
            return Err(TokenError::ExpiryTooFar);
        }

        for attempt in 1..=MAX_ISSUE_ATTEMPTS {
            let value = self.generator.generate()?;
            let record = AccessToken::new(value, owner_id, requested_expiry, now);

            if self.db.insert_if_unclaimed(&record, now)? {
                info!(
                    owner_id = %owner_id,
                    token_id = %record.id,
                    expires = %record.expiry,
                    "Access token issued"
                );
                return Ok(IssuedToken {
                    token: record.token,
                    expires: record.expiry,
                });
            }

            warn!(
                owner_id = %owner_id,
                attempt,
                "Generated token value already in use, drawing again"
            );
        }

        Err(StoreError::CollisionLimit {
            attempts: MAX_ISSUE_ATTEMPTS,
        }
        .into())
    }

    /// Verify that `token` belongs to `owner_id` and has not expired.
    pub fn verify(&self, owner_id: &str, token: &str) -> Result<ValidToken, TokenError> {
        self.verify_at(owner_id, token, Utc::now())
    }

    /// Verify as if the current time were `now`.
    ///
    /// The token value and owner must both match exactly. A token issued to
    /// someone else is reported as not found, never as belonging to another
    /// user.
    pub fn verify_at(
        &self,
        owner_id: &str,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<ValidToken, TokenError> {
        let owner_id = require_owner(owner_id)?;

        // Nothing of another shape is ever stored
        if !is_well_formed(token) {
            return Err(TokenError::TokenNotFound);
        }

        let records = self.db.find_for_owner(token, owner_id)?;
        if records.is_empty() {
            debug!(owner_id = %owner_id, "Token verification failed: no matching record");
            return Err(TokenError::TokenNotFound);
        }

        let live = records
            .iter()
            .filter(|record| !record.is_expired_at(now))
            .max_by_key(|record| record.expiry);

        match live {
            Some(record) => Ok(ValidToken {
                expires: record.expiry,
            }),
            None => {
                debug!(owner_id = %owner_id, "Token verification failed: expired");
                Err(TokenError::Expired)
            }
        }
    }
}

fn require_owner(owner_id: &str) -> Result<&str, TokenError> {
    if owner_id.trim().is_empty() {
        Err(TokenError::Unauthenticated)
    } else {
        Ok(owner_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::generator::test_support::ScriptedSource;
    use chrono::TimeZone;

    fn service() -> (TokenService, Arc<TokenDatabase>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(TokenDatabase::open(&dir.path().join("tokens.redb")).unwrap());
        db.register_principal("u1").unwrap();
        db.register_principal("u2").unwrap();
        let svc = TokenService::new(db.clone(), TokenGenerator::new());
        (svc, db, dir)
    }

    /// Service whose generator yields `AAAAAA` for byte 0, `BBBBBB` for 1, ...
    fn scripted_service(script: &[u8]) -> (TokenService, Arc<TokenDatabase>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(TokenDatabase::open(&dir.path().join("tokens.redb")).unwrap());
        db.register_principal("u1").unwrap();
        db.register_principal("u2").unwrap();
        let generator = TokenGenerator::with_source(Arc::new(ScriptedSource::new(script)));
        (TokenService::new(db.clone(), generator), db, dir)
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn issue_then_verify_scenario() {
        let (svc, _db, _dir) = service();
        let now = at(2024, 1, 1, 0);
        let expiry = at(2024, 1, 2, 0);

        let issued = svc.issue_at("u1", expiry, now).unwrap();
        assert!(is_well_formed(&issued.token));
        assert_eq!(issued.expires, expiry);

        let valid = svc.verify_at("u1", &issued.token, at(2024, 1, 1, 12)).unwrap();
        assert_eq!(valid.expires, expiry);

        assert!(matches!(
            svc.verify_at("u1", &issued.token, at(2024, 1, 3, 0)),
            Err(TokenError::Expired)
        ));
        assert!(matches!(
            svc.verify_at("u2", &issued.token, at(2024, 1, 1, 12)),
            Err(TokenError::TokenNotFound)
        ));
    }

    #[test]
    fn token_is_valid_at_exact_expiry() {
        let (svc, _db, _dir) = service();
        let now = at(2024, 1, 1, 0);
        let expiry = at(2024, 1, 1, 6);
        let issued = svc.issue_at("u1", expiry, now).unwrap();

        assert!(svc.verify_at("u1", &issued.token, expiry).is_ok());
        assert!(matches!(
            svc.verify_at("u1", &issued.token, expiry + TimeDelta::seconds(1)),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn verify_can_be_repeated() {
        let (svc, _db, _dir) = service();
        let now = Utc::now();
        let issued = svc.issue("u1", now + TimeDelta::hours(1)).unwrap();

        for _ in 0..3 {
            assert!(svc.verify("u1", &issued.token).is_ok());
        }
    }

    #[test]
    fn expiry_must_be_in_the_future() {
        let (svc, _db, _dir) = service();
        let now = at(2024, 1, 1, 0);

        assert!(matches!(
            svc.issue_at("u1", now, now),
            Err(TokenError::InvalidExpiry)
        ));
        assert!(matches!(
            svc.issue_at("u1", now - TimeDelta::days(1), now),
            Err(TokenError::InvalidExpiry)
        ));
    }

    #[test]
    fn expiry_bound_is_three_days_inclusive() {
        let (svc, _db, _dir) = service();
        let now = at(2024, 1, 1, 0);

        assert!(svc.issue_at("u1", now + MAX_TOKEN_LIFETIME, now).is_ok());
        assert!(matches!(
            svc.issue_at("u1", now + MAX_TOKEN_LIFETIME + TimeDelta::milliseconds(1), now),
            Err(TokenError::ExpiryTooFar)
        ));
        assert!(matches!(
            svc.issue_at("u1", now + TimeDelta::days(4), now),
            Err(TokenError::ExpiryTooFar)
        ));
    }

    #[test]
    fn owner_checks_come_before_expiry_checks() {
        let (svc, _db, _dir) = service();
        let now = at(2024, 1, 1, 0);
        let past = now - TimeDelta::days(1);

        assert!(matches!(
            svc.issue_at("", past, now),
            Err(TokenError::Unauthenticated)
        ));
        assert!(matches!(
            svc.issue_at("   ", past, now),
            Err(TokenError::Unauthenticated)
        ));
        assert!(matches!(
            svc.issue_at("ghost", past, now),
            Err(TokenError::PrincipalNotFound)
        ));
    }

    #[test]
    fn removed_principal_cannot_issue() {
        let (svc, db, _dir) = service();
        db.remove_principal("u1").unwrap();
        assert!(matches!(
            svc.issue("u1", Utc::now() + TimeDelta::hours(1)),
            Err(TokenError::PrincipalNotFound)
        ));
    }

    #[test]
    fn verify_requires_owner() {
        let (svc, _db, _dir) = service();
        assert!(matches!(
            svc.verify("", "ABC123"),
            Err(TokenError::Unauthenticated)
        ));
    }

    #[test]
    fn verify_is_case_sensitive() {
        let (svc, _db, _dir) = service();
        let now = at(2024, 1, 1, 0);
        let issued = svc.issue_at("u1", at(2024, 1, 2, 0), now).unwrap();

        let lowered = issued.token.to_lowercase();
        if lowered != issued.token {
            assert!(matches!(
                svc.verify_at("u1", &lowered, now),
                Err(TokenError::TokenNotFound)
            ));
        }
    }

    #[test]
    fn identical_requests_mint_distinct_tokens() {
        let (svc, db, _dir) = service();
        let now = at(2024, 1, 1, 0);
        let expiry = at(2024, 1, 2, 0);

        let first = svc.issue_at("u1", expiry, now).unwrap();
        let second = svc.issue_at("u1", expiry, now).unwrap();

        assert_ne!(first.token, second.token);
        assert_eq!(db.find_for_owner(&first.token, "u1").unwrap().len(), 1);
        assert_eq!(db.find_for_owner(&second.token, "u1").unwrap().len(), 1);
    }

    #[test]
    fn live_record_wins_over_expired_duplicate() {
        let (svc, db, _dir) = service();
        let old_issue = at(2024, 1, 1, 0);
        let stale = AccessToken::new("DUP001".into(), "u1", at(2024, 1, 1, 1), old_issue);
        db.insert_if_unclaimed(&stale, old_issue).unwrap();

        let now = at(2024, 1, 2, 0);
        let fresh = AccessToken::new("DUP001".into(), "u1", at(2024, 1, 3, 0), now);
        assert!(db.insert_if_unclaimed(&fresh, now).unwrap());

        let valid = svc.verify_at("u1", "DUP001", now).unwrap();
        assert_eq!(valid.expires, fresh.expiry);
    }

    #[test]
    fn held_value_is_redrawn() {
        let (svc, db, _dir) = scripted_service(&[0, 0, 1]);
        let now = at(2024, 1, 1, 0);
        let expiry = at(2024, 1, 2, 0);

        let first = svc.issue_at("u2", expiry, now).unwrap();
        assert_eq!(first.token, "AAAAAA");

        let second = svc.issue_at("u1", expiry, now).unwrap();
        assert_eq!(second.token, "BBBBBB");
        assert!(db.find_for_owner("AAAAAA", "u1").unwrap().is_empty());
        assert_eq!(db.find_for_owner("BBBBBB", "u1").unwrap().len(), 1);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let (svc, db, _dir) = scripted_service(&[0]);
        let now = at(2024, 1, 1, 0);
        let expiry = at(2024, 1, 2, 0);
        svc.issue_at("u2", expiry, now).unwrap();

        let err = svc.issue_at("u1", expiry, now).unwrap_err();
        assert!(matches!(
            err,
            TokenError::Store(StoreError::CollisionLimit {
                attempts: MAX_ISSUE_ATTEMPTS
            })
        ));
        assert!(err.is_internal());
        assert!(db.find_for_owner("AAAAAA", "u1").unwrap().is_empty());
        assert_eq!(db.find_for_owner("AAAAAA", "u2").unwrap().len(), 1);
    }

    #[test]
    fn expired_holder_does_not_block_reissue() {
        let (svc, _db, _dir) = scripted_service(&[0]);
        let first = svc.issue_at("u2", at(2024, 1, 1, 6), at(2024, 1, 1, 0)).unwrap();
        let now = at(2024, 1, 2, 0);
        let second = svc.issue_at("u1", at(2024, 1, 3, 0), now).unwrap();
        assert_eq!(first.token, second.token);
        assert!(svc.verify_at("u1", &second.token, now).is_ok());
    }

    #[test]
    fn malformed_token_is_not_found() {
        let (svc, _db, _dir) = service();
        for candidate in ["", "abc123", "ABC12", "ABCDEFG", "ABC 12"] {
            assert!(matches!(
                svc.verify("u1", candidate),
                Err(TokenError::TokenNotFound)
            ));
        }
    }
}
