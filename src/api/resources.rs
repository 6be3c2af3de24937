// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-user resource endpoints.
//!
//! Every resource type shares the same two handlers; the path segment picks
//! the [`ResourceType`](crate::storage::ResourceType) once the caller is
//! authorized. All operations require authentication and only ever
//! touch the caller's own namespace.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::{Map, Value};

use super::SuccessResponse;
use crate::{
    auth::BearerCredential,
    error::{ApiError, ErrorResponse},
    state::AppState,
};

/// Read the caller's value for a resource.
///
/// Returns the default (an empty list, or the default automation settings)
/// when nothing has been saved yet.
#[utoipa::path(
    get,
    path = "/api/{resource}",
    tag = "Resources",
    security(("bearer_auth" = [])),
    params(
        ("resource" = String, Path, description = "Resource name, e.g. `transactions`, `savings-goals`, `automation-settings`")
    ),
    responses(
        (status = 200, description = "`{\"<resourceName>\": value}`, or `{\"settings\": value}` for automation settings", body = serde_json::Value),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Unknown resource", body = ErrorResponse),
        (status = 500, description = "Storage or authentication service unavailable", body = ErrorResponse)
    )
)]
pub async fn read_resource(
    State(state): State<AppState>,
    BearerCredential(token): BearerCredential,
    Path(resource): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let (resource, value) = state.gateway.read_request(token.as_deref(), &resource).await?;

    let mut body = Map::new();
    body.insert(resource.response_field().to_string(), value);
    Ok(Json(Value::Object(body)))
}

/// Replace the caller's value for a resource.
///
/// The body is `{"<resourceName>": value}`; automation settings take the
/// settings object as the whole body.
#[utoipa::path(
    post,
    path = "/api/{resource}",
    tag = "Resources",
    security(("bearer_auth" = [])),
    params(
        ("resource" = String, Path, description = "Resource name, e.g. `transactions`, `savings-goals`, `automation-settings`")
    ),
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Saved", body = SuccessResponse),
        (status = 400, description = "Malformed body", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Unknown resource", body = ErrorResponse),
        (status = 500, description = "Storage or authentication service unavailable", body = ErrorResponse)
    )
)]
pub async fn write_resource(
    State(state): State<AppState>,
    BearerCredential(token): BearerCredential,
    Path(resource): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let body = body.map(|Json(value)| value).map_err(|e| e.body_text());

    state
        .gateway
        .write_request(token.as_deref(), &resource, body)
        .await?;
    Ok(Json(SuccessResponse::ok()))
}
