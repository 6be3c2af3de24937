// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::Request,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi, ToSchema,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    accounts::{RegisterRequest, ResetPasswordRequest},
    error::ErrorResponse,
    state::AppState,
};

pub mod accounts;
pub mod health;
pub mod reports;
pub mod resources;

/// Body of a successful write.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/register", post(accounts::register))
        .route("/reset-password", post(accounts::reset_password))
        .route("/send-report", post(reports::send_report))
        .route(
            "/{resource}",
            get(resources::read_resource).post(resources::write_resource),
        );

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");
            // Path only: query strings never reach the logs
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                path = %request.uri().path(),
                request_id = %request_id,
            )
        }))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        resources::read_resource,
        resources::write_resource,
        reports::send_report,
        accounts::register,
        accounts::reset_password,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            SuccessResponse,
            ErrorResponse,
            RegisterRequest,
            ResetPasswordRequest,
            reports::SendReportRequest,
            reports::ReportSentResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Resources", description = "Per-user financial data"),
        (name = "Reports", description = "Emailed financial reports"),
        (name = "Accounts", description = "Account provisioning and password reset"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
