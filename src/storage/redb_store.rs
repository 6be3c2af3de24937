// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded resource store backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `resources`: namespace key → JSON bytes
//!
//! redb calls block on disk I/O, so every operation runs on the blocking
//! thread pool.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use redb::{Database, ReadableDatabase, TableDefinition};
use serde_json::Value;

use super::{KeyValueStore, ResourceKey, StoreError, StoreResult};

/// Namespace key → serialized JSON payload.
const RESOURCES: TableDefinition<&str, &[u8]> = TableDefinition::new("resources");

/// File name of the database inside the data directory.
pub const DB_FILE_NAME: &str = "resources.redb";

pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Unavailable(format!("cannot create {}: {e}", parent.display())))?;
        }
        let db = Database::create(path)?;

        // Pre-create the table so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(RESOURCES)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    fn get_blocking(db: &Database, key: &str) -> StoreResult<Option<Value>> {
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(RESOURCES)?;
        match table.get(key)? {
            Some(bytes) => {
                let value = serde_json::from_slice(bytes.value()).map_err(|source| {
                    StoreError::Corrupt {
                        key: key.to_string(),
                        source,
                    }
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn set_blocking(db: &Database, key: &str, json: &[u8]) -> StoreResult<()> {
        let write_txn = db.begin_write()?;
        {
            let mut table = write_txn.open_table(RESOURCES)?;
            table.insert(key, json)?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for RedbStore {
    async fn get(&self, key: &ResourceKey) -> StoreResult<Option<Value>> {
        let db = Arc::clone(&self.db);
        let key = key.as_str().to_string();
        tokio::task::spawn_blocking(move || Self::get_blocking(&db, &key))
            .await
            .map_err(|e| StoreError::Unavailable(format!("blocking task failed: {e}")))?
    }

    async fn set(&self, key: &ResourceKey, value: &Value) -> StoreResult<()> {
        let json = serde_json::to_vec(value)?;
        let db = Arc::clone(&self.db);
        let key = key.as_str().to_string();
        tokio::task::spawn_blocking(move || Self::set_blocking(&db, &key, &json))
            .await
            .map_err(|e| StoreError::Unavailable(format!("blocking task failed: {e}")))?
    }

    async fn ping(&self) -> StoreResult<()> {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || -> StoreResult<()> {
            let read_txn = db.begin_read()?;
            let _ = read_txn.open_table(RESOURCES)?;
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("blocking task failed: {e}")))?
    }

    fn backend(&self) -> &'static str {
        "redb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{build_key, ResourceType};
    use serde_json::json;
    use tempfile::TempDir;

    fn open_temp() -> (RedbStore, TempDir) {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let store = RedbStore::open(&dir.path().join("nested").join(DB_FILE_NAME))
            .expect("Failed to open redb store");
        (store, dir)
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let (store, _dir) = open_temp();
        let key = build_key(ResourceType::Accounts, "user_1");
        assert_eq!(store.get(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn write_then_read() {
        let (store, _dir) = open_temp();
        let key = build_key(ResourceType::Accounts, "user_1");
        let value = json!([{"id": "acc-1", "balance": 1250.5}]);

        store.set(&key, &value).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), Some(value));
    }

    #[tokio::test]
    async fn values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DB_FILE_NAME);
        let key = build_key(ResourceType::PaymentMethods, "user_7");

        {
            let store = RedbStore::open(&path).unwrap();
            store.set(&key, &json!(["pix"])).await.unwrap();
        }

        let store = RedbStore::open(&path).unwrap();
        assert_eq!(store.get(&key).await.unwrap(), Some(json!(["pix"])));
    }

    #[tokio::test]
    async fn corrupt_bytes_surface_as_error() {
        let (store, _dir) = open_temp();
        let key = build_key(ResourceType::Alerts, "user_1");
        RedbStore::set_blocking(&store.db, key.as_str(), b"not json").unwrap();

        let result = store.get(&key).await;
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
    }

    #[tokio::test]
    async fn ping_succeeds_on_open_db() {
        let (store, _dir) = open_temp();
        store.ping().await.unwrap();
        assert_eq!(store.backend(), "redb");
    }
}
