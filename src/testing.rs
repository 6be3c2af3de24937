// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process fakes for the verifier, store, delivery and identity admin seams.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::{
    accounts::{AccountService, AdminError, IdentityAdmin, NewAccount},
    auth::{AuthorizationGate, IdentityVerifier, Principal, VerificationError},
    gateway::ResourceGateway,
    notify::{DeliveryError, DeliveryReceipt, EmailDelivery, LogOnlyDelivery, OutboundEmail},
    state::AppState,
    storage::{KeyValueStore, MemoryStore, ResourceKey, StoreError, StoreResult},
};

/// Verifier backed by a fixed token table.
#[derive(Default)]
pub struct StaticVerifier {
    users: HashMap<String, String>,
    calls: AtomicUsize,
}

impl StaticVerifier {
    /// Always rejected as expired.
    pub const EXPIRED_TOKEN: &'static str = "token-expired";
    /// Always fails as if the identity provider were down.
    pub const OUTAGE_TOKEN: &'static str = "token-outage";

    pub fn with_users(users: &[(&str, &str)]) -> Self {
        Self {
            users: users
                .iter()
                .map(|(token, id)| (token.to_string(), id.to_string()))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityVerifier for StaticVerifier {
    async fn validate(&self, token: &str) -> Result<Principal, VerificationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match token {
            Self::EXPIRED_TOKEN => Err(VerificationError::Expired),
            Self::OUTAGE_TOKEN => Err(VerificationError::Unavailable("provider down".to_string())),
            other => self
                .users
                .get(other)
                .map(|id| Principal::new(id.clone()))
                .ok_or(VerificationError::Malformed),
        }
    }
}

/// Verifier that never answers in time.
pub struct SlowVerifier {
    delay: Duration,
}

impl SlowVerifier {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl IdentityVerifier for SlowVerifier {
    async fn validate(&self, _token: &str) -> Result<Principal, VerificationError> {
        tokio::time::sleep(self.delay).await;
        Ok(Principal::new("late"))
    }
}

/// Memory store that counts the calls reaching it and can be told to fail.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    gets: AtomicUsize,
    sets: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    delay: Option<Duration>,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl KeyValueStore for CountingStore {
    async fn get(&self, key: &ResourceKey) -> StoreResult<Option<Value>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected read failure".to_string()));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &ResourceKey, value: &Value) -> StoreResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected write failure".to_string()));
        }
        self.inner.set(key, value).await
    }

    async fn ping(&self) -> StoreResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected read failure".to_string()));
        }
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "counting"
    }
}

/// Delivery that keeps every message it is handed.
#[derive(Default)]
pub struct RecordingDelivery {
    sent: Mutex<Vec<OutboundEmail>>,
}

impl RecordingDelivery {
    pub async fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl EmailDelivery for RecordingDelivery {
    async fn deliver(&self, email: OutboundEmail) -> Result<DeliveryReceipt, DeliveryError> {
        self.sent.lock().await.push(email);
        Ok(DeliveryReceipt {
            delivery_id: uuid::Uuid::new_v4(),
        })
    }
}

/// Identity admin that remembers created emails.
#[derive(Default)]
pub struct FakeIdentityAdmin {
    created: Mutex<HashSet<String>>,
    unavailable: bool,
}

impl FakeIdentityAdmin {
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }

    pub async fn created(&self) -> Vec<String> {
        let mut emails: Vec<String> = self.created.lock().await.iter().cloned().collect();
        emails.sort();
        emails
    }
}

#[async_trait]
impl IdentityAdmin for FakeIdentityAdmin {
    async fn create_account(&self, account: &NewAccount) -> Result<String, AdminError> {
        if self.unavailable {
            return Err(AdminError::Unavailable("connection refused".to_string()));
        }
        let mut created = self.created.lock().await;
        if !created.insert(account.email.clone()) {
            return Err(AdminError::EmailTaken);
        }
        Ok(format!("uid-{}", created.len()))
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AdminError> {
        if self.unavailable {
            return Err(AdminError::Unavailable("connection refused".to_string()));
        }
        if self.created.lock().await.contains(email) {
            Ok(())
        } else {
            Err(AdminError::UnknownEmail)
        }
    }
}

pub fn gateway_with(verifier: StaticVerifier, store: Arc<CountingStore>) -> ResourceGateway {
    ResourceGateway::new(
        AuthorizationGate::new(Arc::new(verifier), Duration::from_secs(1)),
        store,
        Arc::new(LogOnlyDelivery),
        Duration::from_secs(1),
    )
}

/// Application state over fakes, with account endpoints enabled.
pub fn test_state(verifier: StaticVerifier, store: Arc<CountingStore>) -> AppState {
    let accounts = AccountService::new(
        Arc::new(FakeIdentityAdmin::default()),
        Arc::new(LogOnlyDelivery),
    );
    AppState::new(gateway_with(verifier, store)).with_accounts(accounts)
}
