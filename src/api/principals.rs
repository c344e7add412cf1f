// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin-only principal management.
//!
//! The registration system calls these endpoints (with an admin session) to
//! make users known to the token service, and to retire them. Removing a
//! principal blocks new issues; tokens already issued stay valid until they
//! expire.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;

use crate::{auth::AdminOnly, error::ApiError, models::Principal, state::AppState};

/// Request body for POST /v1/principals
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterPrincipalRequest {
    /// User ID as it appears in the session JWT `sub` claim
    #[serde(alias = "userId")]
    pub user_id: String,
}

/// Register a principal so it may be issued tokens.
///
/// Registering an existing principal returns the stored row unchanged.
#[utoipa::path(
    post,
    path = "/v1/principals",
    tag = "Principals",
    security(("bearer" = [])),
    request_body = RegisterPrincipalRequest,
    responses(
        (status = 201, description = "Principal registered", body = Principal),
        (status = 400, description = "Blank user ID"),
        (status = 401, description = "Unauthorized - invalid or missing session token"),
        (status = 403, description = "Admin role required"),
    )
)]
pub async fn register_principal(
    State(state): State<AppState>,
    AdminOnly(admin): AdminOnly,
    payload: Result<Json<RegisterPrincipalRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Principal>), ApiError> {
    let Json(request) = payload?;
    let user_id = request.user_id.trim();
    if user_id.is_empty() {
        return Err(ApiError::bad_request("User ID is required.").with_code("invalid_user_id"));
    }

    let principal = state.db.register_principal(user_id)?;
    info!(admin = %admin.user_id, user_id = %principal.user_id, "Principal registered");

    Ok((StatusCode::CREATED, Json(principal)))
}

/// Remove a principal.
#[utoipa::path(
    delete,
    path = "/v1/principals/{user_id}",
    tag = "Principals",
    security(("bearer" = [])),
    params(
        ("user_id" = String, Path, description = "User ID of the principal to remove")
    ),
    responses(
        (status = 204, description = "Principal removed"),
        (status = 401, description = "Unauthorized - invalid or missing session token"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "User not found"),
    )
)]
pub async fn remove_principal(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
    AdminOnly(admin): AdminOnly,
) -> Result<StatusCode, ApiError> {
    if !state.db.remove_principal(&user_id)? {
        return Err(ApiError::not_found("User not found.").with_code("principal_not_found"));
    }
    info!(admin = %admin.user_id, user_id = %user_id, "Principal removed");

    Ok(StatusCode::NO_CONTENT)
}
