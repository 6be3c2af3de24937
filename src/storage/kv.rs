// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The key-value store capability consumed by the gateway.

use async_trait::async_trait;
use serde_json::Value;

use super::ResourceKey;

/// Error type for key-value store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be reached or refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The backend answered, but the stored bytes are not valid JSON.
    #[error("stored value for {key} is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The backend did not answer within the configured timeout.
    #[error("store timed out after {0} ms")]
    Timeout(u64),

    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl From<redb::DatabaseError> for StoreError {
    fn from(e: redb::DatabaseError) -> Self {
        StoreError::Redb(e.into())
    }
}

impl From<redb::TransactionError> for StoreError {
    fn from(e: redb::TransactionError) -> Self {
        StoreError::Redb(e.into())
    }
}

impl From<redb::TableError> for StoreError {
    fn from(e: redb::TableError) -> Self {
        StoreError::Redb(e.into())
    }
}

impl From<redb::StorageError> for StoreError {
    fn from(e: redb::StorageError) -> Self {
        StoreError::Redb(e.into())
    }
}

impl From<redb::CommitError> for StoreError {
    fn from(e: redb::CommitError) -> Self {
        StoreError::Redb(e.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable mapping from namespace key to an opaque JSON value.
///
/// Point reads and point writes only. `set` overwrites unconditionally;
/// there is no compare-and-swap and no listing.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value under `key`, or `None` if nothing was ever written.
    async fn get(&self, key: &ResourceKey) -> StoreResult<Option<Value>>;

    /// Replace the value under `key`.
    async fn set(&self, key: &ResourceKey, value: &Value) -> StoreResult<()>;

    /// Cheap liveness check for readiness probes.
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    /// Backend name for logs and health output.
    fn backend(&self) -> &'static str;
}
