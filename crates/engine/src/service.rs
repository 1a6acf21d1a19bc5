//! The send pipeline.
//!
//! `ReminderService` owns the injected sender and the message catalog, and
//! runs every send (scheduled or operator-triggered) through one pipeline:
//! 1. Single-flight guard: a second send while one is running is rejected
//! 2. Recipient check (`TO_NUMBER`), before any provider I/O
//! 3. Message selection: caller override, or a random catalog pick
//! 4. Provider call, with failures classified and appended to the error log

use std::path::PathBuf;

use chrono::Utc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

use herald_common::config::AppConfig;
use herald_common::error::SendError;
use herald_common::types::{DeliveryAttempt, DeliveryOutcome, DeliveryReceipt, Provider};
use herald_notifier::NotificationSender;

use crate::catalog::MessageCatalog;

/// Central orchestrator shared by the daily trigger and the HTTP facade.
pub struct ReminderService {
    sender: Box<dyn NotificationSender>,
    catalog: MessageCatalog,
    to_number: Option<String>,
    error_log_path: PathBuf,
    in_flight: Mutex<()>,
}

impl ReminderService {
    pub fn new(
        sender: Box<dyn NotificationSender>,
        catalog: MessageCatalog,
        config: &AppConfig,
    ) -> Self {
        Self {
            sender,
            catalog,
            to_number: config.to_number.clone(),
            error_log_path: config.error_log_path.clone(),
            in_flight: Mutex::new(()),
        }
    }

    /// Run one send attempt through the pipeline.
    ///
    /// `override_message` skips catalog selection and delivers the given
    /// text verbatim. Errors come back unchanged so callers can map them;
    /// each failure is also appended to the on-disk error log.
    pub async fn fire(&self, override_message: Option<&str>) -> Result<DeliveryReceipt, SendError> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            tracing::warn!("A send is already in flight, rejecting this attempt");
            return Err(SendError::AlreadyInFlight);
        };

        let result = self.deliver(override_message).await;
        if let Err(e) = &result {
            tracing::error!(
                classification = e.classification(),
                error = %e,
                "Send failed"
            );
            self.append_error_log(e).await;
        }
        result
    }

    async fn deliver(&self, override_message: Option<&str>) -> Result<DeliveryReceipt, SendError> {
        let Some(recipient) = self.to_number.as_deref().filter(|n| !n.is_empty()) else {
            return Err(SendError::Config("TO_NUMBER is not set".to_string()));
        };

        let attempt_id = Uuid::new_v4();
        let body = match override_message {
            Some(text) => text.to_string(),
            None => self.catalog.pick().to_string(),
        };

        // The recipient identifier stays out of default-level logs; the
        // debug-level attempt record below carries it.
        tracing::info!(
            attempt_id = %attempt_id,
            provider = %self.sender.provider(),
            "Sending reminder"
        );

        let result = self.sender.send(recipient, &body).await;

        let attempt = DeliveryAttempt {
            id: attempt_id,
            recipient: recipient.to_string(),
            body,
            provider: self.sender.provider(),
            timestamp_utc: Utc::now(),
            outcome: match &result {
                Ok(receipt) => DeliveryOutcome::Success {
                    provider_message_id: receipt.message_id.clone(),
                },
                Err(e) => DeliveryOutcome::Failure {
                    kind: e.classification().to_string(),
                    detail: e.to_string(),
                },
            },
        };
        tracing::debug!(attempt = ?attempt, "Delivery attempt recorded");

        if let Ok(receipt) = &result {
            tracing::info!(
                attempt_id = %attempt_id,
                message_id = %receipt.message_id,
                status = %receipt.status,
                "Reminder delivered"
            );
        }

        result
    }

    /// Append one line per failure to the on-disk error log:
    /// `{rfc3339} - {classification}: {detail}`. Best-effort: I/O failures
    /// here are debug-logged and swallowed.
    async fn append_error_log(&self, error: &SendError) {
        let line = format!(
            "{} - {}: {}\n",
            Utc::now().to_rfc3339(),
            error.classification(),
            error
        );

        if let Some(parent) = self
            .error_log_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
        {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                tracing::debug!(error = %e, "Could not create error log directory");
                return;
            }
        }

        match tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.error_log_path)
            .await
        {
            Ok(mut file) => {
                if let Err(e) = file.write_all(line.as_bytes()).await {
                    tracing::debug!(error = %e, "Could not append to error log");
                }
            }
            Err(e) => tracing::debug!(error = %e, "Could not open error log"),
        }
    }

    pub fn catalog(&self) -> &MessageCatalog {
        &self.catalog
    }

    pub fn provider(&self) -> Provider {
        self.sender.provider()
    }

    pub fn recipient_configured(&self) -> bool {
        self.to_number.as_deref().is_some_and(|n| !n.is_empty())
    }
}
