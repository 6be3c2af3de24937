// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for the raw bearer credential.
//!
//! The extractor only parses the header. Verification happens inside the
//! gateway so that no operation can skip it:
//!
//! ```rust,ignore
//! async fn read(BearerCredential(token): BearerCredential, State(state): State<AppState>) {
//!     state.gateway.read_resource(token.as_deref(), ResourceType::Goals).await
//! }
//! ```

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

/// Bearer token from the `Authorization` header, if any.
///
/// A header with another scheme counts as no credential.
#[derive(Debug, Clone, Default)]
pub struct BearerCredential(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for BearerCredential {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(BearerCredential(bearer_token(&parts.headers)))
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
///
/// The scheme name is matched case-insensitively (RFC 7235).
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim_start().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}
