// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The authorization gate every gateway operation passes through.

use std::sync::Arc;
use std::time::Duration;

use super::{AuthError, IdentityVerifier, Principal};

/// Proof that a request's credential was verified.
///
/// Only [`AuthorizationGate::authorize`] constructs one.
#[derive(Debug, Clone)]
pub struct AuthorizedContext {
    principal: Principal,
}

impl AuthorizedContext {
    pub fn principal(&self) -> &Principal {
        &self.principal
    }
}

/// Turns a raw bearer credential into an [`AuthorizedContext`].
///
/// Stateless apart from the injected verifier: nothing is cached between
/// calls, so a revoked token stops working on the very next request.
#[derive(Clone)]
pub struct AuthorizationGate {
    verifier: Arc<dyn IdentityVerifier>,
    timeout: Duration,
}

impl AuthorizationGate {
    pub fn new(verifier: Arc<dyn IdentityVerifier>, timeout: Duration) -> Self {
        Self { verifier, timeout }
    }

    pub fn verifier(&self) -> &Arc<dyn IdentityVerifier> {
        &self.verifier
    }

    /// Verify `credential` (scheme prefix already stripped).
    ///
    /// A verifier error or timeout is reported as
    /// [`AuthError::VerifierUnavailable`], never as a grant.
    pub async fn authorize(&self, credential: Option<&str>) -> Result<AuthorizedContext, AuthError> {
        let token = credential
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingCredential)?;

        let outcome = tokio::time::timeout(self.timeout, self.verifier.validate(token)).await;

        match outcome {
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Identity verifier timed out"
                );
                Err(AuthError::VerifierUnavailable("timed out".to_string()))
            }
            Ok(Err(e)) if e.is_unavailable() => {
                tracing::error!(error = %e, "Identity verifier unavailable");
                Err(AuthError::VerifierUnavailable(e.to_string()))
            }
            Ok(Err(e)) => {
                tracing::debug!(reason = e.code(), "Credential rejected");
                Err(AuthError::InvalidCredential)
            }
            Ok(Ok(principal)) if principal.id().is_empty() => {
                tracing::warn!("Verifier returned an empty principal id");
                Err(AuthError::InvalidCredential)
            }
            Ok(Ok(principal)) => Ok(AuthorizedContext { principal }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{SlowVerifier, StaticVerifier};

    fn gate() -> AuthorizationGate {
        AuthorizationGate::new(
            Arc::new(StaticVerifier::with_users(&[("token-u1", "u1")])),
            Duration::from_secs(1),
        )
    }

    #[tokio::test]
    async fn absent_credential_is_missing() {
        assert!(matches!(
            gate().authorize(None).await,
            Err(AuthError::MissingCredential)
        ));
    }

    #[tokio::test]
    async fn blank_credential_is_missing() {
        assert!(matches!(
            gate().authorize(Some("   ")).await,
            Err(AuthError::MissingCredential)
        ));
    }

    #[tokio::test]
    async fn valid_credential_yields_principal() {
        let ctx = gate().authorize(Some("token-u1")).await.unwrap();
        assert_eq!(ctx.principal().id(), "u1");
    }

    #[tokio::test]
    async fn unknown_credential_is_invalid() {
        assert!(matches!(
            gate().authorize(Some("token-nobody")).await,
            Err(AuthError::InvalidCredential)
        ));
    }

    #[tokio::test]
    async fn expired_credential_is_invalid_not_unavailable() {
        assert!(matches!(
            gate().authorize(Some(StaticVerifier::EXPIRED_TOKEN)).await,
            Err(AuthError::InvalidCredential)
        ));
    }

    #[tokio::test]
    async fn verifier_outage_fails_closed() {
        assert!(matches!(
            gate().authorize(Some(StaticVerifier::OUTAGE_TOKEN)).await,
            Err(AuthError::VerifierUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn verifier_timeout_fails_closed() {
        let gate = AuthorizationGate::new(
            Arc::new(SlowVerifier::new(Duration::from_secs(5))),
            Duration::from_millis(20),
        );
        assert!(matches!(
            gate.authorize(Some("anything")).await,
            Err(AuthError::VerifierUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn every_call_reaches_the_verifier() {
        let verifier = Arc::new(StaticVerifier::with_users(&[("token-u1", "u1")]));
        let gate = AuthorizationGate::new(verifier.clone(), Duration::from_secs(1));

        gate.authorize(Some("token-u1")).await.unwrap();
        gate.authorize(Some("token-u1")).await.unwrap();

        assert_eq!(verifier.calls(), 2);
    }
}
