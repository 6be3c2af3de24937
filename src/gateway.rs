// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Resource Gateway
//!
//! One read path and one write path shared by every [`ResourceType`]:
//!
//! ```text
//! credential ──► AuthorizationGate ──► build_key(resource, principal) ──► store get/set
//!                      │ rejected
//!                      └──► Unauthorized (store never touched)
//! ```
//!
//! Writes overwrite: the last write to reach the store wins, with no merge
//! and no version check. Two devices saving the same resource concurrently
//! will clobber each other.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::{
    auth::{AuthError, AuthorizationGate, AuthorizedContext},
    error::ApiError,
    notify::{
        DeliveryError, DeliveryReceipt, EmailDelivery, FormatError, NotificationFormatter,
        OutboundEmail, Template,
    },
    storage::{build_key, KeyValueStore, ResourceType, StoreError, StoreResult},
};

/// Failure of a gateway operation.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("unknown resource: {0}")]
    UnknownResource(String),

    #[error("store operation failed: {0}")]
    Store(#[from] StoreError),

    #[error("report could not be formatted: {0}")]
    Format(#[from] FormatError),

    #[error("delivery failed: {0}")]
    Delivery(#[from] DeliveryError),
}

impl From<GatewayError> for ApiError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Auth(auth) => auth.into(),
            GatewayError::MalformedRequest(message) => ApiError::bad_request(message),
            GatewayError::UnknownResource(_) => ApiError::not_found("Unknown resource"),
            GatewayError::Format(format) => ApiError::bad_request(format.to_string()),
            GatewayError::Store(_) => {
                ApiError::internal("Storage unavailable")
            }
            GatewayError::Delivery(_) => {
                ApiError::internal("Failed to send report")
            }
        }
    }
}

/// Authenticated, namespaced access to per-user resources.
#[derive(Clone)]
pub struct ResourceGateway {
    gate: AuthorizationGate,
    store: Arc<dyn KeyValueStore>,
    formatter: NotificationFormatter,
    delivery: Arc<dyn EmailDelivery>,
    store_timeout: Duration,
}

impl ResourceGateway {
    pub fn new(
        gate: AuthorizationGate,
        store: Arc<dyn KeyValueStore>,
        delivery: Arc<dyn EmailDelivery>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            gate,
            store,
            formatter: NotificationFormatter::default(),
            delivery,
            store_timeout,
        }
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn gate(&self) -> &AuthorizationGate {
        &self.gate
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    async fn authorize(&self, credential: Option<&str>) -> Result<AuthorizedContext, GatewayError> {
        self.gate.authorize(credential).await.map_err(|e| {
            tracing::info!(reason = e.error_code(), "Request rejected by authorization gate");
            GatewayError::Auth(e)
        })
    }

    async fn timed<T>(&self, op: impl Future<Output = StoreResult<T>>) -> StoreResult<T> {
        tokio::time::timeout(self.store_timeout, op)
            .await
            .map_err(|_| StoreError::Timeout(self.store_timeout.as_millis() as u64))?
    }

    /// Read the caller's value for `resource`, or its default if never written.
    pub async fn read_resource(
        &self,
        credential: Option<&str>,
        resource: ResourceType,
    ) -> Result<Value, GatewayError> {
        let ctx = self.authorize(credential).await?;
        self.load(&ctx, resource).await
    }

    /// Read from a request path segment such as `savings-goals`.
    ///
    /// The credential is checked before the segment is resolved, so an
    /// unauthenticated caller cannot tell known paths from unknown ones.
    pub async fn read_request(
        &self,
        credential: Option<&str>,
        segment: &str,
    ) -> Result<(ResourceType, Value), GatewayError> {
        let ctx = self.authorize(credential).await?;
        let resource = resolve_segment(segment)?;
        let value = self.load(&ctx, resource).await?;
        Ok((resource, value))
    }

    async fn load(&self, ctx: &AuthorizedContext, resource: ResourceType) -> Result<Value, GatewayError> {
        let key = build_key(resource, ctx.principal().id());

        match self.timed(self.store.get(&key)).await {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Ok(resource.default_value()),
            Err(e) => {
                tracing::error!(
                    principal = %ctx.principal(),
                    resource = %resource,
                    backend = self.store.backend(),
                    error = %e,
                    "Resource read failed"
                );
                Err(e.into())
            }
        }
    }

    /// Replace the caller's value for `resource` with `payload`.
    pub async fn write_resource(
        &self,
        credential: Option<&str>,
        resource: ResourceType,
        payload: Value,
    ) -> Result<(), GatewayError> {
        let ctx = self.authorize(credential).await?;
        self.store_payload(&ctx, resource, payload).await
    }

    /// Write from a path segment and request body as received over HTTP.
    ///
    /// The credential is checked before the path or body is looked at, so
    /// an unauthenticated caller learns nothing about either.
    pub async fn write_request(
        &self,
        credential: Option<&str>,
        segment: &str,
        body: RawBody,
    ) -> Result<(), GatewayError> {
        let ctx = self.authorize(credential).await?;
        let resource = resolve_segment(segment)?;
        let payload = unwrap_payload(resource, body.map_err(GatewayError::MalformedRequest)?)?;
        self.store_payload(&ctx, resource, payload).await
    }

    async fn store_payload(
        &self,
        ctx: &AuthorizedContext,
        resource: ResourceType,
        payload: Value,
    ) -> Result<(), GatewayError> {
        let key = build_key(resource, ctx.principal().id());

        if let Err(e) = self.timed(self.store.set(&key, &payload)).await {
            tracing::error!(
                principal = %ctx.principal(),
                resource = %resource,
                backend = self.store.backend(),
                error = %e,
                "Resource write failed"
            );
            return Err(e.into());
        }

        tracing::debug!(principal = %ctx.principal(), resource = %resource, "Resource written");
        Ok(())
    }

    /// Render `report` and hand it to the delivery backend.
    ///
    /// Requires authorization but never touches the store.
    pub async fn send_report(
        &self,
        credential: Option<&str>,
        destination: &str,
        report: &Value,
    ) -> Result<DeliveryReceipt, GatewayError> {
        let ctx = self.authorize(credential).await?;
        self.deliver_report(&ctx, destination, report).await
    }

    /// [`send_report`](Self::send_report) from an `{email, report}` body.
    pub async fn report_request(
        &self,
        credential: Option<&str>,
        body: RawBody,
    ) -> Result<DeliveryReceipt, GatewayError> {
        let ctx = self.authorize(credential).await?;
        let body = body.map_err(GatewayError::MalformedRequest)?;

        let destination = body.get("email").and_then(Value::as_str).unwrap_or_default();
        let report = match body.get("report") {
            Some(report) if !report.is_null() => report,
            _ => return Err(GatewayError::MalformedRequest("Missing report".to_string())),
        };
        self.deliver_report(&ctx, destination, report).await
    }

    async fn deliver_report(
        &self,
        ctx: &AuthorizedContext,
        destination: &str,
        report: &Value,
    ) -> Result<DeliveryReceipt, GatewayError> {
        let destination = destination.trim();
        if destination.is_empty() {
            return Err(GatewayError::MalformedRequest(
                "Missing destination email".to_string(),
            ));
        }

        let message = self.formatter.render(Template::Report, report)?;
        let receipt = self
            .delivery
            .deliver(OutboundEmail {
                to: destination.to_string(),
                subject: message.subject,
                body: message.body,
            })
            .await?;

        tracing::info!(
            principal = %ctx.principal(),
            delivery_id = %receipt.delivery_id,
            "Report sent"
        );
        Ok(receipt)
    }
}

fn resolve_segment(segment: &str) -> Result<ResourceType, GatewayError> {
    ResourceType::from_path(segment).ok_or_else(|| GatewayError::UnknownResource(segment.to_string()))
}

/// A request body: parsed JSON, or why it could not be parsed.
pub type RawBody = Result<Value, String>;

/// Pull the stored payload out of a write body.
///
/// Wrapped resources expect `{"<tag>": payload}` with a non-null payload;
/// automation settings take the whole body, which must be an object.
pub fn unwrap_payload(resource: ResourceType, body: Value) -> Result<Value, GatewayError> {
    if !resource.is_wrapped() {
        return match body {
            Value::Object(_) => Ok(body),
            _ => Err(GatewayError::MalformedRequest(format!(
                "{} must be a JSON object",
                resource.tag()
            ))),
        };
    }

    match body {
        Value::Object(mut fields) => match fields.remove(resource.tag()) {
            Some(payload) if !payload.is_null() => Ok(payload),
            _ => Err(GatewayError::MalformedRequest(format!(
                "Missing {} in request body",
                resource.tag()
            ))),
        },
        _ => Err(GatewayError::MalformedRequest(
            "Request body must be a JSON object".to_string(),
        )),
    }
}
