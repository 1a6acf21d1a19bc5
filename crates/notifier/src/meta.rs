//! Meta WhatsApp Business (Cloud API) sender.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use herald_common::config::AppConfig;
use herald_common::error::SendError;
use herald_common::types::{DeliveryReceipt, Provider};

use crate::{NotificationSender, SEND_TIMEOUT, classify_transport, http_client, require};

/// Template used for proactive sends outside the 24h messaging window.
/// Must exist pre-approved under the business account.
pub const TEMPLATE_NAME: &str = "daily_reminder";
pub const TEMPLATE_LANGUAGE: &str = "es_AR";

/// Sends messages through the Graph API `/messages` endpoint with a Bearer
/// token and a JSON body. Free-form text by default; a pre-approved
/// template when configured for out-of-window delivery.
pub struct MetaSender {
    access_token: Option<String>,
    phone_number_id: Option<String>,
    api_version: String,
    use_template: bool,
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl MetaSender {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        Ok(Self {
            access_token: config.meta_access_token.clone(),
            phone_number_id: config.meta_phone_number_id.clone(),
            api_version: config.meta_api_version.clone(),
            use_template: config.meta_use_template,
            base_url: "https://graph.facebook.com".to_string(),
            timeout: SEND_TIMEOUT,
            client: http_client(SEND_TIMEOUT)?,
        })
    }

    /// Point the sender at a different API host (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Replace the send timeout (tests exercise the timeout path with a
    /// short one).
    pub fn with_timeout(mut self, timeout: Duration) -> anyhow::Result<Self> {
        self.timeout = timeout;
        self.client = http_client(timeout)?;
        Ok(self)
    }

    /// Build the request body: free-form text, or the approved template
    /// when the 24h messaging window cannot be assumed open.
    fn payload(&self, to: &str, body: &str) -> serde_json::Value {
        if self.use_template {
            json!({
                "messaging_product": "whatsapp",
                "to": to,
                "type": "template",
                "template": {
                    "name": TEMPLATE_NAME,
                    "language": { "code": TEMPLATE_LANGUAGE }
                }
            })
        } else {
            json!({
                "messaging_product": "whatsapp",
                "to": to,
                "type": "text",
                "text": { "body": body }
            })
        }
    }
}

#[async_trait]
impl NotificationSender for MetaSender {
    async fn send(&self, recipient: &str, body: &str) -> Result<DeliveryReceipt, SendError> {
        let access_token = require(&self.access_token, "META_ACCESS_TOKEN")?;
        let phone_number_id = require(&self.phone_number_id, "META_PHONE_NUMBER_ID")?;

        // The Graph API wants bare E.164 digits, unlike Twilio's
        // "whatsapp:+NN" form.
        let to = normalize_recipient(recipient);
        let url = format!(
            "{}/{}/{}/messages",
            self.base_url, self.api_version, phone_number_id
        );

        tracing::debug!(provider = "meta", template = self.use_template, "Dispatching message");

        let response = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .json(&self.payload(&to, body))
            .send()
            .await
            .map_err(|e| classify_transport(e, self.timeout))?;

        let status = response.status();
        if status.is_success() {
            let accepted: SendResponse = response.json().await.map_err(|e| {
                SendError::UnknownProvider(format!("Meta success body was unreadable: {e}"))
            })?;
            let message_id = accepted
                .messages
                .into_iter()
                .next()
                .map(|m| m.id)
                .ok_or_else(|| {
                    SendError::UnknownProvider(
                        "Meta accepted the send but returned no message id".to_string(),
                    )
                })?;
            tracing::info!(
                provider = "meta",
                message_id = %message_id,
                template = self.use_template,
                "Message accepted"
            );
            return Ok(DeliveryReceipt {
                provider: Provider::Meta,
                message_id,
                // The Cloud API reports no delivery status on accept.
                status: "accepted".to_string(),
                used_template: self.use_template,
                timestamp: Utc::now(),
            });
        }

        let error: ErrorResponse = response.json().await.unwrap_or_default();
        Err(classify_error(status, error))
    }

    fn provider(&self) -> Provider {
        Provider::Meta
    }
}

/// Strip the Twilio-style "whatsapp:+" prefix down to bare digits.
fn normalize_recipient(recipient: &str) -> String {
    recipient
        .trim_start_matches("whatsapp:")
        .trim_start_matches('+')
        .to_string()
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    messages: Vec<SentMessage>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
    error: Option<ErrorBody>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    code: Option<i64>,
    message: Option<String>,
}

/// Map Graph API error codes (with HTTP-status fallbacks for unreadable
/// bodies) into the taxonomy.
fn classify_error(status: StatusCode, error: ErrorResponse) -> SendError {
    let body = error.error.unwrap_or_default();
    let detail = format!(
        "Meta {}: {}",
        body.code.map_or_else(|| status.to_string(), |c| c.to_string()),
        body.message
            .unwrap_or_else(|| "no error message".to_string())
    );

    match body.code {
        // Recipient not in the allowed list / not a WhatsApp number.
        Some(131030) => SendError::RecipientNotRegistered(detail),
        // 24h window closed: only a template may go through.
        Some(131026) => SendError::RateLimited(format!(
            "{detail} (messaging window closed, template required)"
        )),
        Some(132000) => SendError::RateLimited(detail),
        Some(190) => SendError::Auth(detail),
        _ if status == StatusCode::UNAUTHORIZED => SendError::Auth(detail),
        _ if status == StatusCode::TOO_MANY_REQUESTS => SendError::RateLimited(detail),
        _ => SendError::UnknownProvider(detail),
    }
}
