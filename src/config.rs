// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! once at startup into a [`GatewayConfig`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `AUTH_JWKS_URL` | JWKS endpoint of the identity provider | Required unless built with `dev` |
//! | `AUTH_ISSUER` | Expected JWT issuer claim | Optional |
//! | `AUTH_AUDIENCE` | Expected JWT audience claim | Optional |
//! | `STORE_BACKEND` | `redb`, `rest` or `memory` | `redb` |
//! | `DATA_DIR` | Directory holding the redb file | `./data` |
//! | `KV_REST_API_URL` | Base URL of the REST key-value service | Required for `rest` |
//! | `KV_REST_API_TOKEN` | Bearer token for the REST key-value service | Required for `rest` |
//! | `IDENTITY_ADMIN_URL` | Identity provider admin API | `https://identitytoolkit.googleapis.com/v1` |
//! | `IDENTITY_API_KEY` | Identity provider API key; enables `/api/register` and `/api/reset-password` | Optional |
//! | `VERIFIER_TIMEOUT_MS` | Token verification timeout | `5000` |
//! | `STORE_TIMEOUT_MS` | Store operation timeout | `5000` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM files; both set enables HTTPS | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::accounts::DEFAULT_ADMIN_URL;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// JWKS endpoint used to verify bearer tokens.
///
/// Must be HTTPS. Without it the server refuses to start unless the `dev`
/// feature is enabled, in which case token signatures are not checked.
pub const AUTH_JWKS_URL_ENV: &str = "AUTH_JWKS_URL";
pub const AUTH_ISSUER_ENV: &str = "AUTH_ISSUER";
pub const AUTH_AUDIENCE_ENV: &str = "AUTH_AUDIENCE";

pub const STORE_BACKEND_ENV: &str = "STORE_BACKEND";

/// Environment variable name for the data directory path.
///
/// Only read by the `redb` backend.
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const KV_REST_API_URL_ENV: &str = "KV_REST_API_URL";
pub const KV_REST_API_TOKEN_ENV: &str = "KV_REST_API_TOKEN";

pub const IDENTITY_ADMIN_URL_ENV: &str = "IDENTITY_ADMIN_URL";
pub const IDENTITY_API_KEY_ENV: &str = "IDENTITY_API_KEY";

pub const VERIFIER_TIMEOUT_MS_ENV: &str = "VERIFIER_TIMEOUT_MS";
pub const STORE_TIMEOUT_MS_ENV: &str = "STORE_TIMEOUT_MS";

pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";

pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} is required{reason}")]
    Missing { name: &'static str, reason: &'static str },
    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Which [`KeyValueStore`](crate::storage::KeyValueStore) backs the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Embedded redb file under `data_dir`.
    Redb { data_dir: PathBuf },
    /// Remote REST key-value service.
    Rest { url: Url, token: String },
    /// Process memory; lost on restart.
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSettings {
    pub jwks_url: Option<Url>,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityAdminSettings {
    pub url: Url,
    pub api_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsSettings {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

/// Everything the server needs, resolved and validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub bind_addr: SocketAddr,
    pub auth: AuthSettings,
    pub store: StoreBackend,
    pub store_timeout: Duration,
    pub identity_admin: Option<IdentityAdminSettings>,
    pub tls: Option<TlsSettings>,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let host = var(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or(PORT_ENV, var(PORT_ENV), DEFAULT_PORT)?;
        let bind_addr = SocketAddr::from_str(&format!("{host}:{port}")).map_err(|e| {
            ConfigError::Invalid {
                name: HOST_ENV,
                value: host.clone(),
                reason: e.to_string(),
            }
        })?;

        let jwks_url = var(AUTH_JWKS_URL_ENV)
            .map(|raw| parse_url(AUTH_JWKS_URL_ENV, &raw))
            .transpose()?;
        if let Some(url) = &jwks_url {
            if url.scheme() != "https" {
                return Err(ConfigError::Invalid {
                    name: AUTH_JWKS_URL_ENV,
                    value: url.to_string(),
                    reason: "must use https".to_string(),
                });
            }
        }
        if jwks_url.is_none() && cfg!(not(feature = "dev")) {
            return Err(ConfigError::Missing {
                name: AUTH_JWKS_URL_ENV,
                reason: " (build with the dev feature to skip signature checks)",
            });
        }

        let auth = AuthSettings {
            jwks_url,
            issuer: var(AUTH_ISSUER_ENV),
            audience: var(AUTH_AUDIENCE_ENV),
            timeout: Duration::from_millis(parse_or(
                VERIFIER_TIMEOUT_MS_ENV,
                var(VERIFIER_TIMEOUT_MS_ENV),
                DEFAULT_TIMEOUT_MS,
            )?),
        };

        let store = match var(STORE_BACKEND_ENV).as_deref().unwrap_or("redb") {
            "redb" => StoreBackend::Redb {
                data_dir: PathBuf::from(
                    var(DATA_DIR_ENV).unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
                ),
            },
            "rest" => {
                let url = var(KV_REST_API_URL_ENV).ok_or(ConfigError::Missing {
                    name: KV_REST_API_URL_ENV,
                    reason: " when STORE_BACKEND=rest",
                })?;
                let token = var(KV_REST_API_TOKEN_ENV).ok_or(ConfigError::Missing {
                    name: KV_REST_API_TOKEN_ENV,
                    reason: " when STORE_BACKEND=rest",
                })?;
                StoreBackend::Rest {
                    url: parse_url(KV_REST_API_URL_ENV, &url)?,
                    token,
                }
            }
            "memory" => StoreBackend::Memory,
            other => {
                return Err(ConfigError::Invalid {
                    name: STORE_BACKEND_ENV,
                    value: other.to_string(),
                    reason: "expected redb, rest or memory".to_string(),
                })
            }
        };

        let store_timeout = Duration::from_millis(parse_or(
            STORE_TIMEOUT_MS_ENV,
            var(STORE_TIMEOUT_MS_ENV),
            DEFAULT_TIMEOUT_MS,
        )?);

        let identity_admin = match var(IDENTITY_API_KEY_ENV) {
            Some(api_key) => Some(IdentityAdminSettings {
                url: parse_url(
                    IDENTITY_ADMIN_URL_ENV,
                    &var(IDENTITY_ADMIN_URL_ENV).unwrap_or_else(|| DEFAULT_ADMIN_URL.to_string()),
                )?,
                api_key,
            }),
            None => None,
        };

        let tls = match (var(TLS_CERT_PATH_ENV), var(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsSettings {
                cert_path: PathBuf::from(cert),
                key_path: PathBuf::from(key),
            }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ConfigError::Missing {
                    name: TLS_KEY_PATH_ENV,
                    reason: " when TLS_CERT_PATH is set",
                })
            }
            (None, Some(_)) => {
                return Err(ConfigError::Missing {
                    name: TLS_CERT_PATH_ENV,
                    reason: " when TLS_KEY_PATH is set",
                })
            }
        };

        Ok(Self {
            bind_addr,
            auth,
            store,
            store_timeout,
            identity_admin,
            tls,
        })
    }
}

fn parse_url(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::Invalid {
        name,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn parse_or<T>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            value: raw,
            reason: e.to_string(),
        }),
    }
}
