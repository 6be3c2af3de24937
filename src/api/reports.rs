// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::BearerCredential,
    error::{ApiError, ErrorResponse},
    state::AppState,
};

/// Request to email a financial report.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SendReportRequest {
    /// Destination address.
    pub email: String,
    /// Report data: `period`, `totalIncome`, `totalExpenses`, `balance`,
    /// `topCategories`. Absent fields are left out of the email.
    pub report: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportSentResponse {
    pub success: bool,
    pub delivery_id: Uuid,
}

/// Render a report and email it.
#[utoipa::path(
    post,
    path = "/api/send-report",
    tag = "Reports",
    security(("bearer_auth" = [])),
    request_body = SendReportRequest,
    responses(
        (status = 200, description = "Report handed to delivery", body = ReportSentResponse),
        (status = 400, description = "Missing email or report", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Delivery or authentication service unavailable", body = ErrorResponse)
    )
)]
pub async fn send_report(
    State(state): State<AppState>,
    BearerCredential(token): BearerCredential,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ReportSentResponse>, ApiError> {
    let body = body.map(|Json(value)| value).map_err(|e| e.body_text());
    let receipt = state.gateway.report_request(token.as_deref(), body).await?;

    Ok(Json(ReportSentResponse {
        success: true,
        delivery_id: receipt.delivery_id,
    }))
}
