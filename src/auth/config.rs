// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session JWT verification settings.

use jsonwebtoken::{Algorithm, DecodingKey, Validation};

/// Clock skew tolerance (60 seconds).
pub const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Authentication configuration, built once at startup.
#[derive(Clone)]
pub struct AuthConfig {
    decoding_key: DecodingKey,
    /// Expected issuer (not checked when unset)
    pub issuer: Option<String>,
    /// Expected audience (not checked when unset)
    pub audience: Option<String>,
}

impl AuthConfig {
    /// HS256 verification with a shared secret.
    pub fn hs256(secret: &[u8]) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret),
            issuer: None,
            audience: None,
        }
    }

    /// Set the expected issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Set the expected audience.
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }

    /// Validation rules for incoming session tokens.
    pub fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.set_required_spec_claims(&["exp", "sub"]);

        if let Some(ref issuer) = self.issuer {
            validation.set_issuer(&[issuer]);
        }

        if let Some(ref audience) = self.audience {
            validation.set_audience(&[audience]);
        } else {
            validation.validate_aud = false;
        }

        validation
    }
}
