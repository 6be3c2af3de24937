// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account provisioning and password reset.
//!
//! Both are pass-throughs to the identity provider's administrative API; the
//! gateway keeps no account state of its own. A successful registration is
//! followed by a welcome email through the same delivery backend reports use.
//!
//! ## Provider API
//!
//! [`IdentityToolkitAdmin`] speaks the Identity Toolkit REST dialect:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | create | `POST {base}/accounts:signUp?key=..` `{email, password, displayName}` |
//! | reset | `POST {base}/accounts:sendOobCode?key=..` `{requestType: "PASSWORD_RESET", email}` |
//!
//! Errors come back as `{"error": {"message": "EMAIL_EXISTS"}}`, sometimes
//! with a detail suffix (`"WEAK_PASSWORD : Password should be ..."`).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

use crate::{
    error::ApiError,
    notify::{EmailDelivery, NotificationFormatter, OutboundEmail, Template},
};

/// Default Identity Toolkit endpoint.
pub const DEFAULT_ADMIN_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// HTTP timeout for admin calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Fields required to provision an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("email already registered")]
    EmailTaken,
    #[error("invalid email address")]
    InvalidEmail,
    #[error("password rejected: {0}")]
    WeakPassword(String),
    #[error("no account for this email")]
    UnknownEmail,
    #[error("identity provider rejected the request: {0}")]
    Rejected(String),
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Administrative capability of the identity provider.
#[async_trait]
pub trait IdentityAdmin: Send + Sync {
    /// Create the account, returning the provider's user id.
    async fn create_account(&self, account: &NewAccount) -> Result<String, AdminError>;

    /// Ask the provider to email a password reset link.
    async fn send_password_reset(&self, email: &str) -> Result<(), AdminError>;
}

#[derive(Debug, Deserialize)]
struct SignUpResponse {
    #[serde(rename = "localId")]
    local_id: String,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderError,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    #[serde(default)]
    message: String,
}

/// Identity Toolkit REST client.
pub struct IdentityToolkitAdmin {
    base_url: Url,
    api_key: String,
    client: reqwest::Client,
}

impl IdentityToolkitAdmin {
    pub fn new(base_url: Url, api_key: impl Into<String>) -> Result<Self, AdminError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AdminError::Unavailable(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url,
            api_key: api_key.into(),
            client,
        })
    }

    fn endpoint(&self, method: &str) -> Result<Url, AdminError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AdminError::Unavailable(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .push(method);
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    async fn call(&self, method: &str, body: serde_json::Value) -> Result<reqwest::Response, AdminError> {
        let response = self
            .client
            .post(self.endpoint(method)?)
            .json(&body)
            .send()
            .await
            .map_err(|e| AdminError::Unavailable(e.to_string()))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        if status.is_server_error() {
            return Err(AdminError::Unavailable(format!("HTTP {status} from identity provider")));
        }

        let message = response
            .json::<ProviderErrorBody>()
            .await
            .map(|b| b.error.message)
            .unwrap_or_default();
        Err(classify_provider_error(&message))
    }
}

/// Map a provider error code (`"CODE"` or `"CODE : detail"`) to [`AdminError`].
fn classify_provider_error(message: &str) -> AdminError {
    let (code, detail) = match message.split_once(':') {
        Some((code, detail)) => (code.trim(), detail.trim()),
        None => (message.trim(), ""),
    };

    match code {
        "EMAIL_EXISTS" => AdminError::EmailTaken,
        "INVALID_EMAIL" | "MISSING_EMAIL" => AdminError::InvalidEmail,
        "WEAK_PASSWORD" | "MISSING_PASSWORD" => AdminError::WeakPassword(detail.to_string()),
        "EMAIL_NOT_FOUND" | "USER_NOT_FOUND" => AdminError::UnknownEmail,
        "" => AdminError::Rejected("unknown error".to_string()),
        other => AdminError::Rejected(other.to_string()),
    }
}

#[async_trait]
impl IdentityAdmin for IdentityToolkitAdmin {
    async fn create_account(&self, account: &NewAccount) -> Result<String, AdminError> {
        let response = self
            .call(
                "accounts:signUp",
                json!({
                    "email": account.email,
                    "password": account.password,
                    "displayName": account.name,
                    "returnSecureToken": false,
                }),
            )
            .await?;

        let created: SignUpResponse = response
            .json()
            .await
            .map_err(|e| AdminError::Unavailable(format!("invalid signUp response: {e}")))?;
        Ok(created.local_id)
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AdminError> {
        self.call(
            "accounts:sendOobCode",
            json!({ "requestType": "PASSWORD_RESET", "email": email }),
        )
        .await
        .map(|_| ())
    }
}

/// Failure of a registration or reset request.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("missing required fields: {0}")]
    MissingFields(String),
    #[error(transparent)]
    Admin(#[from] AdminError),
}

impl From<AccountError> for ApiError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::MissingFields(fields) => {
                ApiError::bad_request(format!("Missing required fields: {fields}"))
            }
            AccountError::Admin(AdminError::EmailTaken) => {
                ApiError::bad_request("Email already registered")
            }
            AccountError::Admin(AdminError::InvalidEmail) => {
                ApiError::bad_request("Invalid email address")
            }
            AccountError::Admin(AdminError::WeakPassword(_)) => {
                ApiError::bad_request("Password is too weak")
            }
            AccountError::Admin(AdminError::UnknownEmail | AdminError::Rejected(_)) => {
                ApiError::bad_request("Request rejected by identity provider")
            }
            AccountError::Admin(AdminError::Unavailable(_)) => {
                ApiError::internal("Account service unavailable")
            }
        }
    }
}

/// Body of a registration request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
}

/// Body of a password reset request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub email: String,
}

/// Registration and reset, with the welcome email on top.
#[derive(Clone)]
pub struct AccountService {
    admin: Arc<dyn IdentityAdmin>,
    formatter: NotificationFormatter,
    delivery: Arc<dyn EmailDelivery>,
}

impl AccountService {
    pub fn new(admin: Arc<dyn IdentityAdmin>, delivery: Arc<dyn EmailDelivery>) -> Self {
        Self {
            admin,
            formatter: NotificationFormatter::default(),
            delivery,
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<(), AccountError> {
        let email = request.email.trim().to_string();
        let name = request.name.trim().to_string();

        let missing: Vec<&str> = [
            ("email", email.is_empty()),
            ("password", request.password.is_empty()),
            ("name", name.is_empty()),
        ]
        .into_iter()
        .filter_map(|(field, empty)| empty.then_some(field))
        .collect();
        if !missing.is_empty() {
            return Err(AccountError::MissingFields(missing.join(", ")));
        }

        let account = NewAccount {
            email,
            password: request.password,
            name,
        };
        let user_id = self.admin.create_account(&account).await.inspect_err(|e| {
            tracing::warn!(error = %e, "Account provisioning failed");
        })?;
        tracing::info!(user_id = %user_id, "Account provisioned");

        // The account exists at this point; a lost welcome email is not a failure
        match self
            .formatter
            .render(Template::Welcome, &json!({"name": account.name, "email": account.email}))
        {
            Ok(message) => {
                let email = OutboundEmail {
                    to: account.email,
                    subject: message.subject,
                    body: message.body,
                };
                if let Err(e) = self.delivery.deliver(email).await {
                    tracing::warn!(user_id = %user_id, error = %e, "Welcome email not delivered");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Welcome email not rendered"),
        }

        Ok(())
    }

    /// Request a reset link.
    ///
    /// Unknown addresses report success so the endpoint cannot be used to
    /// probe which emails have accounts.
    pub async fn reset_password(&self, request: ResetPasswordRequest) -> Result<(), AccountError> {
        let email = request.email.trim();
        if email.is_empty() {
            return Err(AccountError::MissingFields("email".to_string()));
        }

        match self.admin.send_password_reset(email).await {
            Ok(()) | Err(AdminError::UnknownEmail) => Ok(()),
            Err(e) => {
                tracing::warn!(error = %e, "Password reset request failed");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use crate::testing::{FakeIdentityAdmin, RecordingDelivery};

    fn service() -> (AccountService, Arc<FakeIdentityAdmin>, Arc<RecordingDelivery>) {
        let admin = Arc::new(FakeIdentityAdmin::default());
        let delivery = Arc::new(RecordingDelivery::default());
        (
            AccountService::new(admin.clone(), delivery.clone()),
            admin,
            delivery,
        )
    }

    fn register_request() -> RegisterRequest {
        RegisterRequest {
            email: "ana@example.com".to_string(),
            password: "s3cret-pass".to_string(),
            name: "Ana".to_string(),
        }
    }

    #[tokio::test]
    async fn register_creates_account_and_sends_welcome() {
        let (service, admin, delivery) = service();
        service.register(register_request()).await.unwrap();

        assert_eq!(admin.created().await, vec!["ana@example.com".to_string()]);
        let sent = delivery.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ana@example.com");
        assert!(sent[0].body.starts_with("Hi Ana,"));
    }

    #[tokio::test]
    async fn register_lists_missing_fields() {
        let (service, admin, _) = service();
        let result = service
            .register(RegisterRequest {
                email: "ana@example.com".to_string(),
                ..Default::default()
            })
            .await;

        match result {
            Err(AccountError::MissingFields(fields)) => assert_eq!(fields, "password, name"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(admin.created().await.is_empty());
    }

    #[tokio::test]
    async fn duplicate_email_is_bad_request() {
        let (service, _, _) = service();
        service.register(register_request()).await.unwrap();

        let err: ApiError = service.register(register_request()).await.unwrap_err().into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Email already registered");
    }

    #[tokio::test]
    async fn reset_for_unknown_email_still_succeeds() {
        let (service, _, _) = service();
        service
            .reset_password(ResetPasswordRequest {
                email: "nobody@example.com".to_string(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn reset_requires_email() {
        let (service, _, _) = service();
        let err: ApiError = service
            .reset_password(ResetPasswordRequest::default())
            .await
            .unwrap_err()
            .into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn provider_outage_is_internal_error() {
        let admin = Arc::new(FakeIdentityAdmin::unavailable());
        let service = AccountService::new(admin, Arc::new(RecordingDelivery::default()));

        let err: ApiError = service.register(register_request()).await.unwrap_err().into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Account service unavailable");
    }

    #[test]
    fn provider_codes_are_classified() {
        assert!(matches!(classify_provider_error("EMAIL_EXISTS"), AdminError::EmailTaken));
        assert!(matches!(
            classify_provider_error("WEAK_PASSWORD : Password should be at least 6 characters"),
            AdminError::WeakPassword(detail) if detail == "Password should be at least 6 characters"
        ));
        assert!(matches!(classify_provider_error("EMAIL_NOT_FOUND"), AdminError::UnknownEmail));
        assert!(matches!(classify_provider_error("OPERATION_NOT_ALLOWED"), AdminError::Rejected(_)));
    }

    #[test]
    fn endpoint_appends_method_and_key() {
        let admin = IdentityToolkitAdmin::new(Url::parse(DEFAULT_ADMIN_URL).unwrap(), "k123").unwrap();
        let url = admin.endpoint("accounts:signUp").unwrap();
        assert_eq!(
            url.as_str(),
            "https://identitytoolkit.googleapis.com/v1/accounts:signUp?key=k123"
        );
    }
}
