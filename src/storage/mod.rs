// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Resource Storage Module
//!
//! Namespacing rules plus the key-value store capability and its adapters.
//!
//! ## Security Model
//!
//! - Keys are built only from a verified principal id ([`build_key`])
//! - The store is shared across all users; isolation comes from the key
//! - Payloads are opaque JSON; storage never inspects financial fields
//!
//! ## Backends
//!
//! | Backend | Type | Use |
//! |---------|------|-----|
//! | `redb` | [`RedbStore`] | Embedded file under `DATA_DIR` |
//! | `rest` | [`RestKvStore`] | Hosted Redis-compatible REST KV |
//! | `memory` | [`MemoryStore`] | Local development, tests |

pub mod keys;
pub mod kv;
pub mod memory;
pub mod redb_store;
pub mod rest;

pub use keys::{build_key, ResourceKey, ResourceType, KEY_DELIMITER};
pub use kv::{KeyValueStore, StoreError, StoreResult};
pub use memory::MemoryStore;
pub use redb_store::RedbStore;
pub use rest::RestKvStore;
