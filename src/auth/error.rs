// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authorization gate rejections.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;

/// Message returned for every credential rejection.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";

/// Message returned when the identity provider cannot be consulted.
pub const VERIFIER_UNAVAILABLE_MESSAGE: &str = "Authentication service unavailable";

/// Outcome of a failed [`AuthorizationGate::authorize`](super::AuthorizationGate::authorize).
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No bearer token on the request.
    #[error("authorization credential is missing")]
    MissingCredential,
    /// The verifier rejected the token (expired, malformed, revoked, unknown).
    #[error("authorization credential is invalid")]
    InvalidCredential,
    /// The verifier failed or timed out. Never treated as a grant.
    #[error("identity verifier unavailable: {0}")]
    VerifierUnavailable(String),
}

impl AuthError {
    /// Short code for structured logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_credential",
            AuthError::InvalidCredential => "invalid_credential",
            AuthError::VerifierUnavailable(_) => "verifier_unavailable",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingCredential | AuthError::InvalidCredential => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::VerifierUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        let message = match &e {
            AuthError::MissingCredential | AuthError::InvalidCredential => UNAUTHORIZED_MESSAGE,
            AuthError::VerifierUnavailable(_) => VERIFIER_UNAVAILABLE_MESSAGE,
        };
        ApiError::new(e.status_code(), message)
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
