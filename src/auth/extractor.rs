// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for authenticated users.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user.user_id is the owner identity for this request
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::decode;

use super::{AuthConfig, AuthError, AuthenticatedUser, SessionClaims};
use crate::state::AppState;

/// Extractor for authenticated users.
///
/// Validates the session JWT from the Authorization header and provides the
/// authenticated user. Rejects with 401 when the header is missing or the
/// token does not verify.
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Extract Authorization header
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        // Extract Bearer token
        let token = auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::InvalidAuthHeader)?;

        let user = verify_session_token(token, &state.auth_config)?;

        Ok(Auth(user))
    }
}

/// Extractor that requires the admin role.
pub struct AdminOnly(pub AuthenticatedUser);

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Auth(user) = Auth::from_request_parts(parts, state).await?;

        if !user.is_admin {
            return Err(AuthError::InsufficientPermissions);
        }

        Ok(AdminOnly(user))
    }
}

/// Verify a session JWT and extract the user it identifies.
pub fn verify_session_token(token: &str, config: &AuthConfig) -> Result<AuthenticatedUser, AuthError> {
    let token_data = decode::<SessionClaims>(token, config.decoding_key(), &config.validation())?;

    if token_data.claims.sub.trim().is_empty() {
        return Err(AuthError::MissingSubject);
    }

    Ok(AuthenticatedUser::from_claims(token_data.claims))
}
