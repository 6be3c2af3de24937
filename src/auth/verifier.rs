// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The identity verification capability and the principal it produces.

use async_trait::async_trait;

/// Verified identity of the caller.
///
/// Produced only by an [`IdentityVerifier`] from a valid credential and kept
/// for the duration of one request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Principal {
    /// Stable user identifier assigned by the identity provider (`sub`).
    user_id: String,
}

impl Principal {
    /// Wrap a provider-issued user id. Only verifier implementations call this.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.user_id
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.user_id)
    }
}

/// Why a verifier refused a credential.
///
/// The variants exist for logs only. Callers of the gateway see a single
/// unauthorized signal regardless of which one occurred, except for
/// [`VerificationError::Unavailable`] which is an infrastructure failure.
#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token issuer is invalid")]
    InvalidIssuer,
    #[error("token audience is invalid")]
    InvalidAudience,
    #[error("token is not yet valid")]
    NotYetValid,
    #[error("no matching key found in JWKS")]
    NoMatchingKey,
    /// The identity provider could not be consulted.
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

impl VerificationError {
    /// Short code for structured logs.
    pub fn code(&self) -> &'static str {
        match self {
            VerificationError::Malformed => "malformed_token",
            VerificationError::InvalidSignature => "invalid_signature",
            VerificationError::Expired => "token_expired",
            VerificationError::InvalidIssuer => "invalid_issuer",
            VerificationError::InvalidAudience => "invalid_audience",
            VerificationError::NotYetValid => "token_not_yet_valid",
            VerificationError::NoMatchingKey => "no_matching_key",
            VerificationError::Unavailable(_) => "verifier_unavailable",
        }
    }

    /// True when the failure says nothing about the credential itself.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, VerificationError::Unavailable(_))
    }
}

/// External identity authority.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Validate a raw bearer token (scheme prefix already stripped).
    async fn validate(&self, token: &str) -> Result<Principal, VerificationError>;

    /// Readiness of the verifier's own dependencies.
    ///
    /// `None` when the verifier has nothing to check.
    async fn check_ready(&self) -> Option<bool> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn principal_exposes_id() {
        let p = Principal::new("user_123");
        assert_eq!(p.id(), "user_123");
        assert_eq!(p.to_string(), "user_123");
    }

    #[test]
    fn only_unavailable_is_infrastructure_failure() {
        assert!(VerificationError::Unavailable("down".into()).is_unavailable());
        assert!(!VerificationError::Expired.is_unavailable());
        assert!(!VerificationError::NoMatchingKey.is_unavailable());
        assert_eq!(VerificationError::Expired.code(), "token_expired");
    }
}
