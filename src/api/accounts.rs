// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account provisioning endpoints.
//!
//! Public: the caller has no account (or no password) yet. Both endpoints
//! are unavailable (500) when no identity admin credentials are configured.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use super::SuccessResponse;
use crate::{
    accounts::{AccountService, RegisterRequest, ResetPasswordRequest},
    error::{ApiError, ErrorResponse},
    state::AppState,
};

fn account_service(state: &AppState) -> Result<&AccountService, ApiError> {
    state.accounts.as_ref().ok_or_else(|| {
        tracing::error!("Account request received but identity admin is not configured");
        ApiError::internal("Account service unavailable")
    })
}

#[utoipa::path(
    post,
    path = "/api/register",
    tag = "Accounts",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = SuccessResponse),
        (status = 400, description = "Missing fields or rejected by the identity provider", body = ErrorResponse),
        (status = 500, description = "Identity provider unavailable", body = ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    account_service(&state)?.register(request).await?;
    Ok(Json(SuccessResponse::ok()))
}

#[utoipa::path(
    post,
    path = "/api/reset-password",
    tag = "Accounts",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Reset email requested", body = SuccessResponse),
        (status = 400, description = "Missing email or rejected by the identity provider", body = ErrorResponse),
        (status = 500, description = "Identity provider unavailable", body = ErrorResponse)
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    body: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    account_service(&state)?.reset_password(request).await?;
    Ok(Json(SuccessResponse::ok()))
}
