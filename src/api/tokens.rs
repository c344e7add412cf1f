// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access token endpoints.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{auth::Auth, error::ApiError, state::AppState};

/// Request body for POST /v1/tokens
#[derive(Debug, Deserialize, ToSchema)]
pub struct IssueTokenRequest {
    /// When the token should stop being valid (RFC 3339, at most 3 days ahead)
    #[serde(alias = "expiryDate")]
    pub expiry_date: DateTime<Utc>,
}

/// Response for POST /v1/tokens
#[derive(Debug, Serialize, ToSchema)]
pub struct IssueTokenResponse {
    /// Six characters from `A-Z0-9`
    pub token: String,
    pub expires: DateTime<Utc>,
}

/// Request body for POST /v1/tokens/verify
#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyTokenRequest {
    pub token: String,
}

/// Response for POST /v1/tokens/verify
#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyTokenResponse {
    pub valid: bool,
    pub message: String,
    pub expires: DateTime<Utc>,
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(rejection.status(), rejection.body_text()).with_code("invalid_request")
    }
}

/// Issue a short-lived access token for the authenticated user.
#[utoipa::path(
    post,
    path = "/v1/tokens",
    tag = "Tokens",
    security(("bearer" = [])),
    request_body = IssueTokenRequest,
    responses(
        (status = 201, description = "Token issued", body = IssueTokenResponse),
        (status = 400, description = "Expiry in the past or more than 3 days ahead"),
        (status = 401, description = "Unauthorized - invalid or missing session token"),
        (status = 404, description = "User not found"),
    )
)]
pub async fn issue_token(
    State(state): State<AppState>,
    Auth(user): Auth,
    payload: Result<Json<IssueTokenRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<IssueTokenResponse>), ApiError> {
    let Json(request) = payload?;
    let issued = state.tokens.issue(&user.user_id, request.expiry_date)?;

    Ok((
        StatusCode::CREATED,
        Json(IssueTokenResponse {
            token: issued.token,
            expires: issued.expires,
        }),
    ))
}

/// Check that a token belongs to the authenticated user and has not expired.
#[utoipa::path(
    post,
    path = "/v1/tokens/verify",
    tag = "Tokens",
    security(("bearer" = [])),
    request_body = VerifyTokenRequest,
    responses(
        (status = 200, description = "Token is valid", body = VerifyTokenResponse),
        (status = 400, description = "Token has expired"),
        (status = 401, description = "Unauthorized - invalid or missing session token"),
        (status = 404, description = "Token not found or owned by someone else"),
    )
)]
pub async fn verify_token(
    State(state): State<AppState>,
    Auth(user): Auth,
    payload: Result<Json<VerifyTokenRequest>, JsonRejection>,
) -> Result<Json<VerifyTokenResponse>, ApiError> {
    let Json(request) = payload?;
    let valid = state.tokens.verify(&user.user_id, &request.token)?;

    Ok(Json(VerifyTokenResponse {
        valid: true,
        message: "Token is valid.".to_string(),
        expires: valid.expires,
    }))
}
