// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Process-local store for development and tests.
//!
//! Values are lost on restart.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{KeyValueStore, ResourceKey, StoreResult};

#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &ResourceKey) -> StoreResult<Option<Value>> {
        Ok(self.entries.read().await.get(key.as_str()).cloned())
    }

    async fn set(&self, key: &ResourceKey, value: &Value) -> StoreResult<()> {
        self.entries
            .write()
            .await
            .insert(key.as_str().to_string(), value.clone());
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{build_key, ResourceType};
    use serde_json::json;

    #[tokio::test]
    async fn absent_key_reads_none() {
        let store = MemoryStore::new();
        let key = build_key(ResourceType::Goals, "user_1");
        assert_eq!(store.get(&key).await.unwrap(), None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn set_overwrites() {
        let store = MemoryStore::new();
        let key = build_key(ResourceType::Goals, "user_1");

        store.set(&key, &json!([1])).await.unwrap();
        store.set(&key, &json!([2])).await.unwrap();

        assert_eq!(store.get(&key).await.unwrap(), Some(json!([2])));
        assert_eq!(store.len().await, 1);
    }
}
