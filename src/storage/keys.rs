// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Resource types and namespace keys.
//!
//! Every stored value lives under a key of the form
//! `<resource tag>:<principal id>`. The principal id always comes from a
//! verified token, never from request input, so a caller can only ever
//! address its own namespace.
//!
//! ## Key Layout
//!
//! ```text
//! transactions:user_2abc        -> [ ... ]
//! automationSettings:user_2abc  -> { "enabled": false, ... }
//! ```

use serde_json::{json, Value};

/// Separator between the resource tag and the principal id.
///
/// No tag contains it, so the first occurrence in a key always marks the end
/// of the tag.
pub const KEY_DELIMITER: char = ':';

/// The closed set of per-user financial data categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Transactions,
    Goals,
    SavingsGoals,
    Accounts,
    RecurringTransactions,
    Alerts,
    AutomationSettings,
    CreditCards,
    InstallmentDebts,
    PaymentMethods,
}

impl ResourceType {
    /// All resource types, in routing-table order.
    pub const ALL: [ResourceType; 10] = [
        ResourceType::Transactions,
        ResourceType::Goals,
        ResourceType::SavingsGoals,
        ResourceType::Accounts,
        ResourceType::RecurringTransactions,
        ResourceType::Alerts,
        ResourceType::AutomationSettings,
        ResourceType::CreditCards,
        ResourceType::InstallmentDebts,
        ResourceType::PaymentMethods,
    ];

    /// Storage tag, also the JSON field name used in request/response bodies.
    pub fn tag(self) -> &'static str {
        match self {
            ResourceType::Transactions => "transactions",
            ResourceType::Goals => "goals",
            ResourceType::SavingsGoals => "savingsGoals",
            ResourceType::Accounts => "accounts",
            ResourceType::RecurringTransactions => "recurringTransactions",
            ResourceType::Alerts => "alerts",
            ResourceType::AutomationSettings => "automationSettings",
            ResourceType::CreditCards => "creditCards",
            ResourceType::InstallmentDebts => "installmentDebts",
            ResourceType::PaymentMethods => "paymentMethods",
        }
    }

    /// URL path segment under the service prefix (kebab-case).
    pub fn path(self) -> &'static str {
        match self {
            ResourceType::Transactions => "transactions",
            ResourceType::Goals => "goals",
            ResourceType::SavingsGoals => "savings-goals",
            ResourceType::Accounts => "accounts",
            ResourceType::RecurringTransactions => "recurring-transactions",
            ResourceType::Alerts => "alerts",
            ResourceType::AutomationSettings => "automation-settings",
            ResourceType::CreditCards => "credit-cards",
            ResourceType::InstallmentDebts => "installment-debts",
            ResourceType::PaymentMethods => "payment-methods",
        }
    }

    /// Resolve a URL path segment.
    pub fn from_path(segment: &str) -> Option<ResourceType> {
        Self::ALL.into_iter().find(|r| r.path() == segment)
    }

    /// Field name wrapping the value in read responses.
    ///
    /// Automation settings are returned as `{"settings": ...}`; everything
    /// else echoes the tag.
    pub fn response_field(self) -> &'static str {
        match self {
            ResourceType::AutomationSettings => "settings",
            other => other.tag(),
        }
    }

    /// Whether writes carry the payload under a wrapper key.
    ///
    /// Automation settings take the whole request body as the payload.
    pub fn is_wrapped(self) -> bool {
        self != ResourceType::AutomationSettings
    }

    /// Value returned when nothing has been stored yet.
    pub fn default_value(self) -> Value {
        match self {
            ResourceType::AutomationSettings => json!({
                "enabled": false,
                "frequency": "monthly",
                "email": "",
                "sendEmail": false,
            }),
            _ => Value::Array(Vec::new()),
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// A storage key derived from a resource type and a verified principal.
///
/// Only [`build_key`] constructs these, so store adapters never see a key
/// that did not pass through the namespace rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey(String);

impl ResourceKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResourceKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Build the namespace key for one principal's one resource type.
///
/// # Panics
///
/// Panics if `principal_id` is empty. An empty id would collapse every
/// caller onto one shared key; the authorization gate never produces one.
pub fn build_key(resource: ResourceType, principal_id: &str) -> ResourceKey {
    assert!(
        !principal_id.is_empty(),
        "refusing to build a {resource} key for an empty principal id"
    );
    ResourceKey(format!("{}{KEY_DELIMITER}{principal_id}", resource.tag()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn key_layout_is_tag_then_principal() {
        let key = build_key(ResourceType::SavingsGoals, "user_123");
        assert_eq!(key.as_str(), "savingsGoals:user_123");
    }

    #[test]
    fn keys_differ_across_principals() {
        for resource in ResourceType::ALL {
            assert_ne!(build_key(resource, "u1"), build_key(resource, "u2"));
        }
    }

    #[test]
    fn keys_differ_across_resource_types() {
        let keys: HashSet<_> = ResourceType::ALL
            .into_iter()
            .map(|r| build_key(r, "user_123"))
            .collect();
        assert_eq!(keys.len(), ResourceType::ALL.len());
    }

    #[test]
    fn principal_containing_delimiter_stays_distinct() {
        // "goals" + "a:b" must not equal any other tag + suffix
        let a = build_key(ResourceType::Goals, "a:b");
        let b = build_key(ResourceType::Goals, "a");
        assert_ne!(a, b);
        assert_eq!(a.as_str().split_once(KEY_DELIMITER), Some(("goals", "a:b")));
    }

    #[test]
    fn tags_never_contain_delimiter() {
        for resource in ResourceType::ALL {
            assert!(!resource.tag().contains(KEY_DELIMITER));
        }
    }

    #[test]
    #[should_panic(expected = "empty principal id")]
    fn empty_principal_is_fatal() {
        let _ = build_key(ResourceType::Transactions, "");
    }

    #[test]
    fn build_key_is_deterministic() {
        assert_eq!(
            build_key(ResourceType::Alerts, "user_9"),
            build_key(ResourceType::Alerts, "user_9")
        );
    }

    #[test]
    fn defaults_are_empty_lists_except_settings() {
        for resource in ResourceType::ALL {
            let default = resource.default_value();
            if resource == ResourceType::AutomationSettings {
                assert_eq!(
                    default,
                    json!({"enabled": false, "frequency": "monthly", "email": "", "sendEmail": false})
                );
            } else {
                assert_eq!(default, json!([]));
            }
        }
    }

    #[test]
    fn path_segments_round_trip() {
        for resource in ResourceType::ALL {
            assert_eq!(ResourceType::from_path(resource.path()), Some(resource));
        }
        assert_eq!(ResourceType::from_path("savingsGoals"), None);
        assert_eq!(ResourceType::from_path("wallets"), None);
    }

    #[test]
    fn settings_use_settings_response_field() {
        assert_eq!(ResourceType::AutomationSettings.response_field(), "settings");
        assert!(!ResourceType::AutomationSettings.is_wrapped());
        assert_eq!(ResourceType::CreditCards.response_field(), "creditCards");
        assert!(ResourceType::CreditCards.is_wrapped());
    }
}
