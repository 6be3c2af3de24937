// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Outbound email delivery.
//!
//! No mail provider is wired in yet: [`LogOnlyDelivery`] records the message
//! in the logs and reports success.

use async_trait::async_trait;
use uuid::Uuid;

/// A message addressed to one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Acknowledgement from the delivery backend.
#[derive(Debug, Clone)]
pub struct DeliveryReceipt {
    /// Identifier for correlating logs with the request.
    pub delivery_id: Uuid,
}

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("delivery backend unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait EmailDelivery: Send + Sync {
    async fn deliver(&self, email: OutboundEmail) -> Result<DeliveryReceipt, DeliveryError>;
}

/// Simulated delivery that always succeeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOnlyDelivery;

#[async_trait]
impl EmailDelivery for LogOnlyDelivery {
    async fn deliver(&self, email: OutboundEmail) -> Result<DeliveryReceipt, DeliveryError> {
        let receipt = DeliveryReceipt {
            delivery_id: Uuid::new_v4(),
        };
        tracing::info!(
            delivery_id = %receipt.delivery_id,
            subject = %email.subject,
            body_len = email.body.len(),
            "Email delivery simulated"
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_only_delivery_always_succeeds() {
        let email = OutboundEmail {
            to: "ana@example.com".to_string(),
            subject: "Report".to_string(),
            body: "Balance: 10.00".to_string(),
        };
        let first = LogOnlyDelivery.deliver(email.clone()).await.unwrap();
        let second = LogOnlyDelivery.deliver(email).await.unwrap();
        assert_ne!(first.delivery_id, second.delivery_id);
    }
}
