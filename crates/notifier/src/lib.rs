//! WhatsApp delivery senders.
//!
//! `NotificationSender` abstracts "deliver a text message to a recipient"
//! over a pluggable provider. Implementations validate their credentials at
//! send-time (never at construction, so the process boots with an
//! incomplete environment), map provider error codes into the closed
//! `SendError` taxonomy, and never retry internally; retry policy belongs
//! to the caller.

pub mod meta;
pub mod twilio;

use std::time::Duration;

use async_trait::async_trait;

use herald_common::config::AppConfig;
use herald_common::error::SendError;
use herald_common::types::{DeliveryReceipt, Provider};

/// Bound on each provider call; slower responses classify as `Timeout`.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Polymorphic message delivery: one network call per send, classified
/// errors, no internal retries.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Deliver `body` to `recipient`, returning the provider's receipt.
    async fn send(&self, recipient: &str, body: &str) -> Result<DeliveryReceipt, SendError>;

    /// Which provider this sender talks to.
    fn provider(&self) -> Provider;
}

/// Build the sender for the configured provider. Called once at startup;
/// the choice is injected into the service and never re-read from the
/// environment afterwards.
pub fn build_sender(config: &AppConfig) -> anyhow::Result<Box<dyn NotificationSender>> {
    Ok(match config.provider {
        Provider::Twilio => Box::new(twilio::TwilioSender::new(config)?),
        Provider::Meta => Box::new(meta::MetaSender::new(config)?),
    })
}

/// HTTP client shared by the senders, with the send timeout applied.
pub(crate) fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().timeout(timeout).build()
}

/// Present-and-non-empty credential lookup; empty strings count as unset.
/// Runs before any network I/O so a misconfigured sender fails fast with
/// `Config` instead of a delivery error.
pub(crate) fn require<'a>(field: &'a Option<String>, var: &str) -> Result<&'a str, SendError> {
    field
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| SendError::Config(format!("{var} is not set")))
}

/// Map transport-level reqwest failures into the taxonomy. Provider
/// responses (any HTTP status) never reach this path.
pub(crate) fn classify_transport(e: reqwest::Error, timeout: Duration) -> SendError {
    if e.is_timeout() {
        SendError::Timeout(format!(
            "provider did not answer within {}s",
            timeout.as_secs()
        ))
    } else {
        SendError::Network(e.to_string())
    }
}
