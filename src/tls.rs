// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Optional HTTPS termination.
//!
//! When both PEM paths are configured the server binds with rustls; otherwise
//! it serves plain HTTP and TLS is left to a fronting proxy.

use axum_server::tls_rustls::RustlsConfig;

use crate::config::TlsSettings;

#[derive(Debug, thiserror::Error)]
#[error("failed to load TLS certificate {cert} / key {key}: {source}")]
pub struct TlsError {
    cert: String,
    key: String,
    #[source]
    source: std::io::Error,
}

/// Install the ring crypto provider for rustls.
///
/// Must run before any TLS configuration is built. A second call is a no-op.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

pub async fn load_rustls_config(settings: &TlsSettings) -> Result<RustlsConfig, TlsError> {
    RustlsConfig::from_pem_file(&settings.cert_path, &settings.key_path)
        .await
        .map_err(|source| TlsError {
            cert: settings.cert_path.display().to_string(),
            key: settings.key_path.display().to_string(),
            source,
        })
}
