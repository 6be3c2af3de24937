// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Hosted key-value store reached over a Redis-compatible REST API.
//!
//! ## Wire Format
//!
//! | Operation | Request | Response |
//! |-----------|---------|----------|
//! | get | `GET {base}/get/{key}` | `{"result": "<json text>"}` or `{"result": null}` |
//! | set | `POST {base}/set/{key}` with the JSON text as body | `{"result": "OK"}` |
//! | ping | `GET {base}/ping` | `{"result": "PONG"}` |
//!
//! Failures come back as `{"error": "..."}` with a non-2xx status. Values are
//! stored as JSON text so any client of the same database reads them back
//! unchanged.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use super::{KeyValueStore, ResourceKey, StoreError, StoreResult};

/// Per-request HTTP timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct RestResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

pub struct RestKvStore {
    base_url: Url,
    token: String,
    client: reqwest::Client,
}

impl RestKvStore {
    pub fn new(base_url: Url, token: impl Into<String>) -> StoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StoreError::Unavailable(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url,
            token: token.into(),
            client,
        })
    }

    /// `{base}/{command}/{key}` with the key percent-encoded as one segment.
    fn command_url(&self, command: &str, key: Option<&str>) -> StoreResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                StoreError::Unavailable(format!("{} cannot be a base URL", self.base_url))
            })?;
            segments.pop_if_empty().push(command);
            if let Some(key) = key {
                segments.push(key);
            }
        }
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> StoreResult<Option<Value>> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let status = response.status();
        let body: RestResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Unavailable(format!("invalid response (HTTP {status}): {e}")))?;

        if let Some(error) = body.error {
            return Err(StoreError::Unavailable(format!("HTTP {status}: {error}")));
        }
        if !status.is_success() {
            return Err(StoreError::Unavailable(format!("HTTP {status} from KV endpoint")));
        }

        Ok(body.result.filter(|v| !v.is_null()))
    }
}

#[async_trait]
impl KeyValueStore for RestKvStore {
    async fn get(&self, key: &ResourceKey) -> StoreResult<Option<Value>> {
        let url = self.command_url("get", Some(key.as_str()))?;
        match self.send(self.client.get(url)).await? {
            None => Ok(None),
            Some(Value::String(text)) => {
                let value = serde_json::from_str(&text).map_err(|source| StoreError::Corrupt {
                    key: key.to_string(),
                    source,
                })?;
                Ok(Some(value))
            }
            // Some clients store structured values directly
            Some(other) => Ok(Some(other)),
        }
    }

    async fn set(&self, key: &ResourceKey, value: &Value) -> StoreResult<()> {
        let url = self.command_url("set", Some(key.as_str()))?;
        let body = serde_json::to_string(value)?;
        match self.send(self.client.post(url).body(body)).await? {
            Some(Value::String(ok)) if ok == "OK" => Ok(()),
            other => Err(StoreError::Unavailable(format!(
                "unexpected set result: {other:?}"
            ))),
        }
    }

    async fn ping(&self) -> StoreResult<()> {
        let url = self.command_url("ping", None)?;
        self.send(self.client.get(url)).await.map(|_| ())
    }

    fn backend(&self) -> &'static str {
        "rest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{build_key, ResourceType};

    fn store(base: &str) -> RestKvStore {
        RestKvStore::new(Url::parse(base).unwrap(), "token").unwrap()
    }

    #[test]
    fn command_url_appends_segments() {
        let store = store("https://kv.example.com");
        let key = build_key(ResourceType::CreditCards, "user_1");
        let url = store.command_url("get", Some(key.as_str())).unwrap();
        assert_eq!(url.as_str(), "https://kv.example.com/get/creditCards:user_1");
    }

    #[test]
    fn command_url_keeps_base_path() {
        let store = store("https://kv.example.com/v1/");
        let url = store.command_url("ping", None).unwrap();
        assert_eq!(url.as_str(), "https://kv.example.com/v1/ping");
    }

    #[test]
    fn command_url_encodes_slashes_in_key() {
        let store = store("https://kv.example.com");
        let key = build_key(ResourceType::Goals, "weird/id");
        let url = store.command_url("set", Some(key.as_str())).unwrap();
        assert_eq!(url.as_str(), "https://kv.example.com/set/goals:weird%2Fid");
    }

    #[test]
    fn response_parses_null_result() {
        let body: RestResponse = serde_json::from_str(r#"{"result":null}"#).unwrap();
        assert!(body.result.filter(|v| !v.is_null()).is_none());
        assert!(body.error.is_none());
    }

    #[test]
    fn response_parses_error() {
        let body: RestResponse = serde_json::from_str(r#"{"error":"WRONGPASS"}"#).unwrap();
        assert_eq!(body.error.as_deref(), Some("WRONGPASS"));
    }
}
