//! Twilio WhatsApp sender (sandbox or production number).

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use serde::Deserialize;

use herald_common::config::AppConfig;
use herald_common::error::SendError;
use herald_common::types::{DeliveryReceipt, Provider};

use crate::{NotificationSender, SEND_TIMEOUT, classify_transport, http_client, require};

/// Sends messages through the Twilio Messages API with basic auth and a
/// form-encoded body. Credentials are held as loaded (possibly absent) and
/// checked on every send.
pub struct TwilioSender {
    account_sid: Option<String>,
    auth_token: Option<String>,
    from_number: Option<String>,
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl TwilioSender {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        Ok(Self {
            account_sid: config.twilio_account_sid.clone(),
            auth_token: config.twilio_auth_token.clone(),
            from_number: config.twilio_from_number.clone(),
            base_url: "https://api.twilio.com".to_string(),
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
}

#[async_trait]
impl NotificationSender for TwilioSender {
    async fn send(&self, recipient: &str, body: &str) -> Result<DeliveryReceipt, SendError> {
        let account_sid = require(&self.account_sid, "TWILIO_ACCOUNT_SID")?;
        let auth_token = require(&self.auth_token, "TWILIO_AUTH_TOKEN")?;
        let from_number = require(&self.from_number, "TWILIO_SANDBOX_NUMBER")?;

        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, account_sid
        );

        tracing::debug!(provider = "twilio", "Dispatching message");

        let response = self
            .client
            .post(&url)
            .basic_auth(account_sid, Some(auth_token))
            .form(&[("From", from_number), ("To", recipient), ("Body", body)])
            .send()
            .await
            .map_err(|e| classify_transport(e, self.timeout))?;

        let status = response.status();
        if status.is_success() {
            let accepted: MessageResponse = response.json().await.map_err(|e| {
                SendError::UnknownProvider(format!("Twilio success body was unreadable: {e}"))
            })?;
            tracing::info!(
                provider = "twilio",
                sid = %accepted.sid,
                status = %accepted.status,
                "Message accepted"
            );
            return Ok(DeliveryReceipt {
                provider: Provider::Twilio,
                message_id: accepted.sid,
                status: accepted.status,
                used_template: false,
                timestamp: Utc::now(),
            });
        }

        let error: ErrorResponse = response.json().await.unwrap_or_default();
        Err(classify_error(status, error))
    }

    fn provider(&self) -> Provider {
        Provider::Twilio
    }
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    sid: String,
    status: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
    code: Option<i64>,
    message: Option<String>,
}

/// Map Twilio error codes (with HTTP-status fallbacks for unreadable
/// bodies) into the taxonomy.
fn classify_error(status: StatusCode, error: ErrorResponse) -> SendError {
    let detail = format!(
        "Twilio {}: {}",
        error.code.map_or_else(|| status.to_string(), |c| c.to_string()),
        error
            .message
            .unwrap_or_else(|| "no error message".to_string())
    );

    match error.code {
        // Malformed number / not a WhatsApp-capable address.
        Some(21211) | Some(21614) => SendError::InvalidRecipient(detail),
        // Recipient has not joined the sandbox.
        Some(21608) => SendError::RecipientNotRegistered(detail),
        Some(20003) => SendError::Auth(detail),
        // 63038: WhatsApp daily message limit.
        Some(20429) | Some(63038) => SendError::RateLimited(detail),
        _ if status == StatusCode::UNAUTHORIZED => SendError::Auth(detail),
        _ if status == StatusCode::TOO_MANY_REQUESTS => SendError::RateLimited(detail),
        _ => SendError::UnknownProvider(detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error(code: i64) -> ErrorResponse {
        ErrorResponse {
            code: Some(code),
            message: Some("details from twilio".to_string()),
        }
    }

    #[test]
    fn test_sandbox_gate_classifies_as_not_registered() {
        let err = classify_error(StatusCode::BAD_REQUEST, error(21608));
        assert!(matches!(err, SendError::RecipientNotRegistered(_)));
        assert!(err.to_string().contains("21608"));
    }

    #[test]
    fn test_malformed_numbers_classify_as_invalid_recipient() {
        assert!(matches!(
            classify_error(StatusCode::BAD_REQUEST, error(21211)),
            SendError::InvalidRecipient(_)
        ));
        assert!(matches!(
            classify_error(StatusCode::BAD_REQUEST, error(21614)),
            SendError::InvalidRecipient(_)
        ));
    }

    #[test]
    fn test_bad_credentials_classify_as_auth() {
        assert!(matches!(
            classify_error(StatusCode::UNAUTHORIZED, error(20003)),
            SendError::Auth(_)
        ));
        // Unreadable body falls back to the HTTP status.
        assert!(matches!(
            classify_error(StatusCode::UNAUTHORIZED, ErrorResponse::default()),
            SendError::Auth(_)
        ));
    }

    #[test]
    fn test_quota_codes_classify_as_rate_limited() {
        assert!(matches!(
            classify_error(StatusCode::TOO_MANY_REQUESTS, error(20429)),
            SendError::RateLimited(_)
        ));
        assert!(matches!(
            classify_error(StatusCode::BAD_REQUEST, error(63038)),
            SendError::RateLimited(_)
        ));
    }

    #[test]
    fn test_unknown_code_keeps_verbatim_detail() {
        let err = classify_error(StatusCode::BAD_REQUEST, error(99999));
        match err {
            SendError::UnknownProvider(detail) => {
                assert!(detail.contains("99999"));
                assert!(detail.contains("details from twilio"));
            }
            other => panic!("expected UnknownProvider, got {other:?}"),
        }
    }
}
