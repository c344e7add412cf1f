// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Errors returned by token issuance and verification.

use axum::http::StatusCode;

use super::generator::RandomUnavailable;
use crate::storage::StoreError;

/// Failure of an issue or verify request.
///
/// Display strings are the messages shown to API callers; store and RNG
/// details are logged, not returned.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// No owner identity was supplied
    #[error("Unauthorized")]
    Unauthenticated,

    /// The owner identity does not resolve to a known principal
    #[error("User not found.")]
    PrincipalNotFound,

    /// No record matches both the token value and the owner
    #[error("Token not found or does not belong to you.")]
    TokenNotFound,

    #[error("Expiry date must be in the future.")]
    InvalidExpiry,

    #[error("Token expiry cannot exceed 3 days.")]
    ExpiryTooFar,

    #[error("Token has expired.")]
    Expired,

    #[error("token store failure: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    RandomUnavailable(#[from] RandomUnavailable),
}

impl TokenError {
    /// Machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            TokenError::Unauthenticated => "unauthenticated",
            TokenError::PrincipalNotFound => "principal_not_found",
            TokenError::TokenNotFound => "token_not_found",
            TokenError::InvalidExpiry => "invalid_expiry",
            TokenError::ExpiryTooFar => "expiry_too_far",
            TokenError::Expired => "token_expired",
            TokenError::Store(_) => "store_failure",
            TokenError::RandomUnavailable(_) => "random_unavailable",
        }
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            TokenError::Unauthenticated => StatusCode::UNAUTHORIZED,
            TokenError::PrincipalNotFound | TokenError::TokenNotFound => StatusCode::NOT_FOUND,
            TokenError::InvalidExpiry | TokenError::ExpiryTooFar | TokenError::Expired => {
                StatusCode::BAD_REQUEST
            }
            TokenError::Store(_) | TokenError::RandomUnavailable(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Whether the error is an internal fault rather than a caller mistake.
    pub fn is_internal(&self) -> bool {
        self.status_code().is_server_error()
    }
}
