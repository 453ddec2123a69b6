use async_trait::async_trait;
use serde_json::json;

use super::{EmailMessage, EmailSender};
use crate::config::EmailConfig;
use crate::error::{AppError, AppResult};

const RESEND_API_URL: &str = "https://api.resend.com/emails";

/// Transactional email over the Resend HTTP API.
pub struct ResendSender {
    client: reqwest::Client,
    api_key: String,
    from: String,
}

impl ResendSender {
    pub fn new(config: &EmailConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build email client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.resend_api_key.clone(),
            from: config.from.clone(),
        })
    }
}

#[async_trait]
impl EmailSender for ResendSender {
    async fn send(&self, message: &EmailMessage) -> AppResult<()> {
        if self.api_key.is_empty() {
            tracing::debug!(
                template = message.template.name(),
                to = %message.to,
                "Email sending disabled, skipping"
            );
            return Ok(());
        }

        let response = self
            .client
            .post(RESEND_API_URL)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.from,
                "to": [message.to],
                "subject": message.subject,
                "html": message.html,
                "tags": [{ "name": "template", "value": message.template.name() }],
            }))
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Email provider unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "Email provider returned {}: {}",
                status, body
            )));
        }

        Ok(())
    }
}
