// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! ## Security
//!
//! - JWKS is fetched via HTTPS only (enforced at config load)
//! - Public keys are cached with a TTL; token verification results never are
//! - An unknown `kid` forces a refetch, so provider key rotation is picked
//!   up before the TTL runs out. The `kid` is read before the signature is
//!   checked, so forced refetches are spaced at least
//!   [`MIN_FORCED_REFRESH_INTERVAL`] apart
//! - A failed fetch is reported as verifier unavailability (fail closed)

use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{Algorithm, DecodingKey};
use tokio::sync::{Mutex, RwLock};

use super::VerificationError;

/// Default JWKS cache TTL (5 minutes).
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// HTTP timeout for a JWKS fetch.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Minimum spacing between refetches triggered by an unknown `kid`.
pub const MIN_FORCED_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// JWKS cache entry.
struct CacheEntry {
    jwks: JwkSet,
    fetched_at: Instant,
}

/// JWKS manager with caching.
#[derive(Clone)]
pub struct JwksManager {
    /// JWKS endpoint of the identity provider
    jwks_url: String,
    /// Cache TTL
    cache_ttl: Duration,
    /// Cached JWKS
    cache: Arc<RwLock<Option<CacheEntry>>>,
    /// When an unknown `kid` last forced a refetch
    last_forced_refresh: Arc<Mutex<Option<Instant>>>,
    /// HTTP client
    client: reqwest::Client,
}

impl JwksManager {
    /// Create a new JWKS manager.
    pub fn new(jwks_url: impl Into<String>) -> Result<Self, VerificationError> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| VerificationError::Unavailable(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            jwks_url: jwks_url.into(),
            cache_ttl: DEFAULT_CACHE_TTL,
            cache: Arc::new(RwLock::new(None)),
            last_forced_refresh: Arc::new(Mutex::new(None)),
            client,
        })
    }

    /// Create with custom cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Seed the cache with a fixed key set that never expires.
    #[cfg(test)]
    pub(crate) fn with_static_keys(self, jwks: JwkSet) -> Self {
        let cache = Arc::new(RwLock::new(Some(CacheEntry {
            jwks,
            fetched_at: Instant::now(),
        })));
        Self {
            cache,
            cache_ttl: Duration::MAX,
            ..self
        }
    }

    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Fetch JWKS (with caching).
    async fn get_jwks(&self) -> Result<JwkSet, VerificationError> {
        {
            let cache = self.cache.read().await;
            if let Some(entry) = &*cache {
                if entry.fetched_at.elapsed() < self.cache_ttl {
                    return Ok(entry.jwks.clone());
                }
            }
        }

        self.refresh().await
    }

    /// Fetch JWKS from the endpoint.
    async fn fetch_jwks(&self) -> Result<JwkSet, VerificationError> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| VerificationError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(VerificationError::Unavailable(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| VerificationError::Unavailable(e.to_string()))
    }

    /// Get a decoding key for the given key ID.
    pub async fn get_decoding_key(
        &self,
        kid: &str,
    ) -> Result<(DecodingKey, Algorithm), VerificationError> {
        let jwks = self.get_jwks().await?;
        if let Some(jwk) = jwks.find(kid) {
            return jwk_to_decoding_key(jwk);
        }

        // Unknown kid: the provider may have rotated keys since the last fetch
        if self.cache_ttl == Duration::MAX || !self.claim_forced_refresh().await {
            return Err(VerificationError::NoMatchingKey);
        }
        tracing::debug!(kid, "Unknown kid, refetching JWKS");
        let jwks = self.refresh().await?;
        let jwk = jwks.find(kid).ok_or(VerificationError::NoMatchingKey)?;
        jwk_to_decoding_key(jwk)
    }

    /// Reserve the next forced refetch, unless one ran too recently.
    async fn claim_forced_refresh(&self) -> bool {
        let mut last = self.last_forced_refresh.lock().await;
        if last.is_some_and(|at| at.elapsed() < MIN_FORCED_REFRESH_INTERVAL) {
            return false;
        }
        *last = Some(Instant::now());
        true
    }

    /// Get any valid decoding key (for tokens without kid).
    pub async fn get_any_decoding_key(&self) -> Result<(DecodingKey, Algorithm), VerificationError> {
        let jwks = self.get_jwks().await?;

        jwks.keys
            .iter()
            .find_map(|jwk| jwk_to_decoding_key(jwk).ok())
            .ok_or(VerificationError::NoMatchingKey)
    }

    /// Force refresh the JWKS cache.
    pub async fn refresh(&self) -> Result<JwkSet, VerificationError> {
        let jwks = self.fetch_jwks().await?;
        let mut cache = self.cache.write().await;
        *cache = Some(CacheEntry {
            jwks: jwks.clone(),
            fetched_at: Instant::now(),
        });
        Ok(jwks)
    }

    /// Check if JWKS is currently cached and valid.
    pub async fn is_cached(&self) -> bool {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .is_some_and(|entry| entry.fetched_at.elapsed() < self.cache_ttl)
    }
}

/// Convert a JWK to a DecodingKey.
///
/// Only asymmetric keys are accepted; a shared secret published in a JWKS
/// would let anyone mint tokens.
fn jwk_to_decoding_key(jwk: &Jwk) -> Result<(DecodingKey, Algorithm), VerificationError> {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => {
            let key = DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
                .map_err(|e| VerificationError::Unavailable(format!("bad RSA key in JWKS: {e}")))?;

            let alg = match jwk.common.key_algorithm {
                Some(KeyAlgorithm::RS384) => Algorithm::RS384,
                Some(KeyAlgorithm::RS512) => Algorithm::RS512,
                Some(KeyAlgorithm::PS256) => Algorithm::PS256,
                _ => Algorithm::RS256,
            };

            Ok((key, alg))
        }
        AlgorithmParameters::EllipticCurve(ec) => {
            let key = DecodingKey::from_ec_components(&ec.x, &ec.y)
                .map_err(|e| VerificationError::Unavailable(format!("bad EC key in JWKS: {e}")))?;

            let alg = match jwk.common.key_algorithm {
                Some(KeyAlgorithm::ES384) => Algorithm::ES384,
                _ => Algorithm::ES256,
            };

            Ok((key, alg))
        }
        _ => Err(VerificationError::NoMatchingKey),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Serve an empty key set on localhost, counting requests.
    async fn serve_empty_jwks() -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = axum::Router::new().route(
            "/jwks.json",
            axum::routing::get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    axum::Json(serde_json::json!({ "keys": [] }))
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        (format!("http://{addr}/jwks.json"), hits)
    }

    #[test]
    fn jwks_manager_creation() {
        let manager = JwksManager::new("https://auth.example.com/.well-known/jwks.json").unwrap();
        assert_eq!(
            manager.jwks_url(),
            "https://auth.example.com/.well-known/jwks.json"
        );
    }

    #[test]
    fn custom_cache_ttl() {
        let manager = JwksManager::new("https://example.com/.well-known/jwks.json")
            .unwrap()
            .with_cache_ttl(Duration::from_secs(60));
        assert_eq!(manager.cache_ttl, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn cache_initially_empty() {
        let manager = JwksManager::new("https://example.com/.well-known/jwks.json").unwrap();
        assert!(!manager.is_cached().await);
    }

    #[tokio::test]
    async fn unknown_kid_in_static_set_is_no_matching_key() {
        let manager = JwksManager::new("https://example.com/.well-known/jwks.json")
            .unwrap()
            .with_static_keys(JwkSet { keys: Vec::new() });
        assert!(manager.is_cached().await);

        let result = manager.get_decoding_key("missing").await;
        assert!(matches!(result, Err(VerificationError::NoMatchingKey)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_unavailable() {
        // Port 9 (discard) on localhost is closed in test environments
        let manager = JwksManager::new("http://127.0.0.1:9/jwks.json").unwrap();
        let result = manager.get_any_decoding_key().await;
        assert!(matches!(result, Err(VerificationError::Unavailable(_))));
    }

    #[tokio::test]
    async fn forged_kids_cannot_force_repeated_fetches() {
        let (url, hits) = serve_empty_jwks().await;
        let manager = JwksManager::new(url).unwrap();

        for i in 0..20 {
            let result = manager.get_decoding_key(&format!("forged-{i}")).await;
            assert!(matches!(result, Err(VerificationError::NoMatchingKey)));
        }

        // Initial fetch plus a single forced refetch
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn symmetric_keys_are_rejected() {
        let jwk: Jwk = serde_json::from_value(serde_json::json!({
            "kty": "oct",
            "k": "c2VjcmV0",
            "kid": "hmac"
        }))
        .unwrap();
        assert!(matches!(
            jwk_to_decoding_key(&jwk),
            Err(VerificationError::NoMatchingKey)
        ));
    }
}
