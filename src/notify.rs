use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::NotifyConfig;
use crate::error::AppError;

const SIGN_IN_SUBJECT: &str = "Admin Login Notification - SeerBharat LMS";

/// Outbound transactional email.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Tell `to` that their admin account just signed in. Returns the relay's message id.
    async fn notify_sign_in(&self, to: &str, name: Option<String>) -> Result<String, AppError>;
}

/// Used when no mail relay is configured.
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn notify_sign_in(&self, to: &str, _name: Option<String>) -> Result<String, AppError> {
        tracing::debug!(to = %to, "Notifications disabled, skipping sign-in email");
        Err(AppError::Notify("Notifications are not configured".into()))
    }
}

#[derive(Debug, Serialize)]
struct Contact<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    email: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TransactionalEmail<'a> {
    sender: Contact<'a>,
    to: Vec<Contact<'a>>,
    subject: &'a str,
    html_content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendResponse {
    message_id: String,
}

/// Sends mail through Brevo's transactional email HTTP API.
pub struct BrevoNotifier {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    sender_name: String,
    sender_email: String,
}

impl BrevoNotifier {
    pub fn new(config: &NotifyConfig) -> Result<Self, AppError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| AppError::Config("notify.api_key not set".into()))?;

        Ok(Self {
            http: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key,
            sender_name: config.sender_name.clone(),
            sender_email: config.sender_email.clone(),
        })
    }
}

#[async_trait]
impl Notifier for BrevoNotifier {
    async fn notify_sign_in(&self, to: &str, name: Option<String>) -> Result<String, AppError> {
        let email = TransactionalEmail {
            sender: Contact {
                name: Some(&self.sender_name),
                email: &self.sender_email,
            },
            to: vec![Contact {
                name: name.as_deref(),
                email: to,
            }],
            subject: SIGN_IN_SUBJECT,
            html_content: sign_in_body(name.as_deref()),
        };

        let response = self
            .http
            .post(&self.api_url)
            .header("api-key", &self.api_key)
            .json(&email)
            .send()
            .await
            .map_err(|e| AppError::Notify(format!("Mail relay unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Notify(format!(
                "Mail relay rejected message ({status}): {body}"
            )));
        }

        let sent: SendResponse = response
            .json()
            .await
            .map_err(|e| AppError::Notify(format!("Unexpected mail relay response: {e}")))?;

        tracing::info!(to = %to, message_id = %sent.message_id, "Sign-in notification sent");
        Ok(sent.message_id)
    }
}

fn sign_in_body(name: Option<&str>) -> String {
    format!(
        "<h2>SeerBharat Learning Management System</h2>\
         <h3>Admin Login Notification</h3>\
         <p>Hello {},</p>\
         <p>Your admin account was successfully logged in at {}.</p>\
         <p>If this was not you, please contact the system administrator immediately.</p>\
         <p>This is an automated message from SeerBharat LMS. Please do not reply to this email.</p>",
        escape_html(name.unwrap_or("Admin")),
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
    )
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Fire-and-forget variant used on sign-in: failures are logged, never returned.
pub async fn notify_sign_in_quietly(notifier: &dyn Notifier, to: &str, name: Option<String>) {
    if let Err(e) = notifier.notify_sign_in(to, name).await {
        tracing::warn!(to = %to, "Sign-in notification failed: {e}");
    }
}
