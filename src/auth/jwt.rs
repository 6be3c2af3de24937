// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT-based [`IdentityVerifier`] implementations.
//!
//! ## Verification Modes
//!
//! - [`JwtVerifier`]: signature, expiry, issuer and audience checks against
//!   the identity provider's JWKS. Used whenever `AUTH_JWKS_URL` is set.
//! - [`InsecureDecodeVerifier`]: structure and expiry only, no signature
//!   check. Only compiled with the `dev` feature.

use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Validation};
use serde::Deserialize;

use super::{IdentityVerifier, JwksManager, Principal, VerificationError};

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Minimal JWT claims needed to identify the caller.
#[derive(Debug, Deserialize)]
struct JwtClaims {
    /// Subject (user ID)
    sub: String,
    /// Expiration timestamp
    #[serde(default)]
    #[cfg_attr(not(any(test, feature = "dev")), allow(dead_code))]
    exp: i64,
}

/// Production verifier backed by the provider's JWKS.
pub struct JwtVerifier {
    jwks: JwksManager,
    issuer: Option<String>,
    audience: Option<String>,
}

impl JwtVerifier {
    pub fn new(jwks: JwksManager) -> Self {
        Self {
            jwks,
            issuer: None,
            audience: None,
        }
    }

    /// Require the `iss` claim to match.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Require the `aud` claim to match.
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }
}

#[async_trait]
impl IdentityVerifier for JwtVerifier {
    async fn validate(&self, token: &str) -> Result<Principal, VerificationError> {
        let header = decode_header(token).map_err(|_| VerificationError::Malformed)?;

        let (decoding_key, algorithm) = match &header.kid {
            Some(kid) => self.jwks.get_decoding_key(kid).await?,
            None => self.jwks.get_any_decoding_key().await?,
        };

        let mut validation = Validation::new(algorithm);
        validation.leeway = CLOCK_SKEW_LEEWAY;

        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }

        match &self.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        let token_data = decode::<JwtClaims>(token, &decoding_key, &validation)
            .map_err(|e| map_jwt_error(e.kind()))?;

        principal_from_claims(token_data.claims)
    }

    async fn check_ready(&self) -> Option<bool> {
        if self.jwks.is_cached().await {
            return Some(true);
        }
        Some(self.jwks.refresh().await.is_ok())
    }
}

fn map_jwt_error(kind: &ErrorKind) -> VerificationError {
    match kind {
        ErrorKind::ExpiredSignature => VerificationError::Expired,
        ErrorKind::InvalidSignature => VerificationError::InvalidSignature,
        ErrorKind::InvalidIssuer => VerificationError::InvalidIssuer,
        ErrorKind::InvalidAudience => VerificationError::InvalidAudience,
        ErrorKind::ImmatureSignature => VerificationError::NotYetValid,
        _ => VerificationError::Malformed,
    }
}

fn principal_from_claims(claims: JwtClaims) -> Result<Principal, VerificationError> {
    if claims.sub.trim().is_empty() {
        return Err(VerificationError::Malformed);
    }
    Ok(Principal::new(claims.sub))
}

/// Development verifier (no signature check).
///
/// WARNING: This should only be used in development environments.
#[cfg(any(test, feature = "dev"))]
pub struct InsecureDecodeVerifier;

#[cfg(any(test, feature = "dev"))]
#[async_trait]
impl IdentityVerifier for InsecureDecodeVerifier {
    async fn validate(&self, token: &str) -> Result<Principal, VerificationError> {
        let token_data = jsonwebtoken::dangerous::insecure_decode::<JwtClaims>(token)
            .map_err(|_| VerificationError::Malformed)?;

        let claims = token_data.claims;
        let now = chrono::Utc::now().timestamp();
        if claims.exp > 0 && claims.exp < now - CLOCK_SKEW_LEEWAY as i64 {
            return Err(VerificationError::Expired);
        }

        principal_from_claims(claims)
    }
}
