//! Outbound email delivery for notifications.
//!
//! Providers:
//! - `console`: logs the email (development)
//! - `sendgrid`: SendGrid v3 mail API

use async_trait::async_trait;
use domain::services::{EmailReceipt, EmailSender, OutgoingEmail};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::EmailConfig;

/// Errors that can occur while handing an email to a provider.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email service not configured")]
    NotConfigured,

    #[error("Email service disabled")]
    Disabled,

    #[error("Unknown email provider: {0}")]
    UnknownProvider(String),

    #[error("Failed to send email: {0}")]
    SendFailed(String),

    #[error("Provider error: {0}")]
    ProviderError(String),
}

/// Email service backed by the configured provider.
#[derive(Clone)]
pub struct EmailService {
    config: Arc<EmailConfig>,
    client: reqwest::Client,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self {
            config: Arc::new(config),
            client: reqwest::Client::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn provider(&self) -> &str {
        &self.config.provider
    }

    /// Deliver one email, returning the provider message id when known.
    pub async fn deliver(&self, email: &OutgoingEmail) -> Result<Option<String>, EmailError> {
        if !self.config.enabled {
            debug!(to = %email.to, subject = %email.subject, "Email service disabled");
            return Err(EmailError::Disabled);
        }

        match self.config.provider.as_str() {
            "console" => Ok(self.send_console(email)),
            "sendgrid" => self.send_sendgrid(email).await,
            provider => {
                error!(provider = %provider, "Unknown email provider");
                Err(EmailError::UnknownProvider(provider.to_string()))
            }
        }
    }

    fn send_console(&self, email: &OutgoingEmail) -> Option<String> {
        let message_id = format!("console-{}", uuid::Uuid::new_v4());
        info!(
            to = %email.to,
            to_name = ?email.to_name,
            subject = %email.subject,
            from = %self.config.sender_email,
            from_name = %self.config.sender_name,
            message_id = %message_id,
            "Email (console provider)"
        );
        debug!(body_text = %email.text_body, html_len = email.html_body.len(), "Email body");
        Some(message_id)
    }

    fn sendgrid_body(&self, email: &OutgoingEmail) -> serde_json::Value {
        let mut recipient = json!({ "email": email.to });
        if let Some(name) = &email.to_name {
            recipient["name"] = json!(name);
        }

        json!({
            "personalizations": [{ "to": [recipient] }],
            "from": {
                "email": self.config.sender_email,
                "name": self.config.sender_name
            },
            "subject": email.subject,
            "content": [
                { "type": "text/plain", "value": email.text_body },
                { "type": "text/html", "value": email.html_body }
            ]
        })
    }

    async fn send_sendgrid(&self, email: &OutgoingEmail) -> Result<Option<String>, EmailError> {
        if self.config.sendgrid_api_key.is_empty() {
            return Err(EmailError::NotConfigured);
        }

        let response = self
            .client
            .post(&self.config.sendgrid_endpoint)
            .bearer_auth(&self.config.sendgrid_api_key)
            .timeout(Duration::from_secs(self.config.request_timeout_secs))
            .json(&self.sendgrid_body(email))
            .send()
            .await
            .map_err(|e| EmailError::SendFailed(format!("SendGrid request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            let message_id = response
                .headers()
                .get("x-message-id")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            info!(to = %email.to, message_id = ?message_id, "Email sent via SendGrid");
            Ok(message_id)
        } else {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, error = %error_body, "SendGrid API error");
            Err(EmailError::ProviderError(format!(
                "SendGrid returned {}: {}",
                status, error_body
            )))
        }
    }
}

#[async_trait]
impl EmailSender for EmailService {
    async fn send(&self, email: OutgoingEmail) -> EmailReceipt {
        match self.deliver(&email).await {
            Ok(message_id) => EmailReceipt::delivered(message_id),
            Err(e) => EmailReceipt::failed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> EmailConfig {
        EmailConfig {
            enabled: true,
            provider: "console".to_string(),
            sender_email: "noreply@test.com".to_string(),
            sender_name: "Test".to_string(),
            ..EmailConfig::default()
        }
    }

    fn email() -> OutgoingEmail {
        OutgoingEmail {
            to: "pm@example.com".to_string(),
            to_name: Some("Dana".to_string()),
            subject: "[Important] Inspection scheduled".to_string(),
            text_body: "Hi Dana".to_string(),
            html_body: "<p>Hi Dana</p>".to_string(),
        }
    }

    #[tokio::test]
    async fn test_console_provider_delivers() {
        let service = EmailService::new(test_config());
        let receipt = service.send(email()).await;

        assert!(receipt.success);
        assert!(receipt.message_id.unwrap().starts_with("console-"));
    }

    #[tokio::test]
    async fn test_disabled_service_reports_failure() {
        let service = EmailService::new(EmailConfig {
            enabled: false,
            ..test_config()
        });
        assert!(!service.is_enabled());

        let receipt = service.send(email()).await;
        assert!(!receipt.success);
        assert_eq!(receipt.error.as_deref(), Some("Email service disabled"));
    }

    #[tokio::test]
    async fn test_unknown_provider() {
        let service = EmailService::new(EmailConfig {
            provider: "carrier-pigeon".to_string(),
            ..test_config()
        });
        let receipt = service.send(email()).await;
        assert!(receipt.error.unwrap().contains("carrier-pigeon"));
    }

    #[tokio::test]
    async fn test_sendgrid_without_key_is_not_configured() {
        let service = EmailService::new(EmailConfig {
            provider: "sendgrid".to_string(),
            ..test_config()
        });
        let err = service.deliver(&email()).await.unwrap_err();
        assert!(matches!(err, EmailError::NotConfigured));
    }

    #[tokio::test]
    async fn test_sendgrid_unreachable_endpoint_fails() {
        let service = EmailService::new(EmailConfig {
            provider: "sendgrid".to_string(),
            sendgrid_api_key: "SG.test".to_string(),
            sendgrid_endpoint: "http://127.0.0.1:1/v3/mail/send".to_string(),
            request_timeout_secs: 2,
            ..test_config()
        });
        let receipt = service.send(email()).await;
        assert!(!receipt.success);
        assert!(receipt.error.unwrap().contains("SendGrid request failed"));
    }

    #[test]
    fn test_sendgrid_body_shape() {
        let service = EmailService::new(test_config());
        let body = service.sendgrid_body(&email());

        assert_eq!(body["personalizations"][0]["to"][0]["email"], "pm@example.com");
        assert_eq!(body["personalizations"][0]["to"][0]["name"], "Dana");
        assert_eq!(body["from"]["email"], "noreply@test.com");
        assert_eq!(body["content"][0]["type"], "text/plain");
        assert_eq!(body["content"][1]["value"], "<p>Hi Dana</p>");
    }
}
