// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum_server::Handle;
use tokio_util::sync::CancellationToken;

use finance_gateway::{
    accounts::{AccountService, AdminError, IdentityToolkitAdmin},
    api::router,
    auth::{AuthorizationGate, IdentityVerifier, JwksManager, JwtVerifier, VerificationError},
    config::{ConfigError, GatewayConfig, StoreBackend},
    gateway::ResourceGateway,
    logging::{self, LogFormat},
    notify::{EmailDelivery, LogOnlyDelivery},
    state::AppState,
    storage::{
        redb_store::DB_FILE_NAME, KeyValueStore, MemoryStore, RedbStore, RestKvStore, StoreError,
    },
    tls::{self, TlsError},
};

/// How long in-flight requests get to finish after Ctrl-C.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("identity verifier: {0}")]
    Verifier(#[from] VerificationError),
    #[error("store: {0}")]
    Store(#[from] StoreError),
    #[error("identity admin: {0}")]
    Admin(#[from] AdminError),
    #[error("tls: {0}")]
    Tls(#[from] TlsError),
    #[error("server: {0}")]
    Serve(#[from] std::io::Error),
}

#[tokio::main]
async fn main() {
    // Install the ring crypto provider for rustls (must be done before any TLS operations)
    tls::install_crypto_provider();
    logging::init(LogFormat::from_env());

    if let Err(e) = run().await {
        tracing::error!(error = %e, "Finance gateway failed to start");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), StartupError> {
    let config = GatewayConfig::from_env()?;

    let verifier = build_verifier(&config)?;
    let store = build_store(&config.store)?;
    let delivery: Arc<dyn EmailDelivery> = Arc::new(LogOnlyDelivery);

    let gateway = ResourceGateway::new(
        AuthorizationGate::new(verifier, config.auth.timeout),
        store,
        delivery.clone(),
        config.store_timeout,
    );

    let mut state = AppState::new(gateway);
    match &config.identity_admin {
        Some(admin) => {
            let admin = IdentityToolkitAdmin::new(admin.url.clone(), admin.api_key.clone())?;
            state = state.with_accounts(AccountService::new(Arc::new(admin), delivery));
        }
        None => tracing::warn!("IDENTITY_API_KEY not set; /api/register and /api/reset-password are disabled"),
    }

    let app = router(state);

    let shutdown = CancellationToken::new();
    let handle = Handle::new();
    tokio::spawn(wait_for_shutdown(shutdown.clone(), handle.clone()));

    let addr = config.bind_addr;
    match &config.tls {
        Some(settings) => {
            let tls_config = tls::load_rustls_config(settings).await?;
            tracing::info!(%addr, "Finance gateway listening on https (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            tracing::info!(%addr, "Finance gateway listening on http (docs at /docs)");
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
    }

    shutdown.cancel();
    tracing::info!("Finance gateway stopped");
    Ok(())
}

fn build_verifier(config: &GatewayConfig) -> Result<Arc<dyn IdentityVerifier>, StartupError> {
    let Some(jwks_url) = &config.auth.jwks_url else {
        return dev_verifier();
    };

    let mut verifier = JwtVerifier::new(JwksManager::new(jwks_url.as_str())?);
    if let Some(issuer) = &config.auth.issuer {
        verifier = verifier.with_issuer(issuer.clone());
    }
    if let Some(audience) = &config.auth.audience {
        verifier = verifier.with_audience(audience.clone());
    }

    tracing::info!(jwks_url = %jwks_url, "Verifying bearer tokens against JWKS");
    Ok(Arc::new(verifier))
}

#[cfg(feature = "dev")]
fn dev_verifier() -> Result<Arc<dyn IdentityVerifier>, StartupError> {
    tracing::warn!("AUTH_JWKS_URL not set; token signatures are NOT verified (dev build)");
    Ok(Arc::new(finance_gateway::auth::InsecureDecodeVerifier))
}

#[cfg(not(feature = "dev"))]
fn dev_verifier() -> Result<Arc<dyn IdentityVerifier>, StartupError> {
    use finance_gateway::config::AUTH_JWKS_URL_ENV;

    // Config loading already refuses a missing JWKS URL outside dev builds
    Err(StartupError::Config(ConfigError::Missing {
        name: AUTH_JWKS_URL_ENV,
        reason: "",
    }))
}

fn build_store(backend: &StoreBackend) -> Result<Arc<dyn KeyValueStore>, StartupError> {
    let store: Arc<dyn KeyValueStore> = match backend {
        StoreBackend::Redb { data_dir } => Arc::new(RedbStore::open(&data_dir.join(DB_FILE_NAME))?),
        StoreBackend::Rest { url, token } => Arc::new(RestKvStore::new(url.clone(), token.clone())?),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };
    tracing::info!(backend = store.backend(), "Key-value store ready");
    Ok(store)
}

async fn wait_for_shutdown(shutdown: CancellationToken, handle: Handle<SocketAddr>) {
    tokio::select! {
        _ = shutdown.cancelled() => return,
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                return;
            }
        }
    }

    tracing::info!(grace_secs = SHUTDOWN_GRACE.as_secs(), "Shutdown requested, draining connections");
    shutdown.cancel();
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
}
