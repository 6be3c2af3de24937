// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Plain-text email bodies for account provisioning and report delivery.
//!
//! Pure formatting: no I/O, no decisions beyond skipping absent fields.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Product name used in subjects and greetings.
pub const APP_NAME: &str = "Finance Tracker";

/// The templates the gateway knows how to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    /// Sent after an account is provisioned. Data: `{name, email}`.
    Welcome,
    /// A financial summary. Data: the client's report object.
    Report,
}

impl Template {
    pub fn name(self) -> &'static str {
        match self {
            Template::Welcome => "welcome",
            Template::Report => "report",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("template {template} needs an object, got {found}")]
    NotAnObject { template: &'static str, found: &'static str },
}

/// A rendered message, ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub body: String,
}

/// Renders [`Template`]s.
#[derive(Debug, Clone)]
pub struct NotificationFormatter {
    app_name: String,
}

impl Default for NotificationFormatter {
    fn default() -> Self {
        Self::new(APP_NAME)
    }
}

impl NotificationFormatter {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }

    /// Render `template` with `data`, stamping reports with the current time.
    pub fn render(&self, template: Template, data: &Value) -> Result<RenderedMessage, FormatError> {
        self.render_at(template, data, Utc::now())
    }

    pub fn render_at(
        &self,
        template: Template,
        data: &Value,
        now: DateTime<Utc>,
    ) -> Result<RenderedMessage, FormatError> {
        let Value::Object(fields) = data else {
            return Err(FormatError::NotAnObject {
                template: template.name(),
                found: kind_of(data),
            });
        };

        match template {
            Template::Welcome => {
                let name = text_field(fields.get("name")).unwrap_or_else(|| "there".to_string());
                let email = text_field(fields.get("email")).unwrap_or_default();

                let mut body = format!("Hi {name},\n\nYour {} account is ready.\n", self.app_name);
                if !email.is_empty() {
                    body.push_str(&format!("You can sign in with {email}.\n"));
                }
                body.push_str(&format!("\nThe {} team\n", self.app_name));

                Ok(RenderedMessage {
                    subject: format!("Welcome to {}", self.app_name),
                    body,
                })
            }
            Template::Report => {
                let mut body = format!("{} financial report\n\n", self.app_name);

                if let Some(period) = text_field(fields.get("period")) {
                    body.push_str(&format!("Period: {period}\n"));
                }
                for (label, key) in [
                    ("Income", "totalIncome"),
                    ("Expenses", "totalExpenses"),
                    ("Balance", "balance"),
                ] {
                    if let Some(amount) = amount_field(fields.get(key)) {
                        body.push_str(&format!("{label}: {amount}\n"));
                    }
                }

                if let Some(Value::Array(categories)) = fields.get("topCategories") {
                    let lines: Vec<String> = categories
                        .iter()
                        .filter_map(|c| {
                            let name = text_field(c.get("name"))?;
                            let amount = amount_field(c.get("amount")).unwrap_or_default();
                            Some(format!("  - {name}: {amount}"))
                        })
                        .collect();
                    if !lines.is_empty() {
                        body.push_str("\nTop categories:\n");
                        body.push_str(&lines.join("\n"));
                        body.push('\n');
                    }
                }

                body.push_str(&format!(
                    "\nGenerated at {}\n",
                    now.format("%Y-%m-%d %H:%M UTC")
                ));

                Ok(RenderedMessage {
                    subject: format!("Your {} report", self.app_name),
                    body,
                })
            }
        }
    }
}

fn text_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn amount_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Number(n) => n.as_f64().map(|f| format!("{f:.2}")),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
