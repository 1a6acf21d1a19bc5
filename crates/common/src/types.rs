use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Supported WhatsApp delivery providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Twilio,
    Meta,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Twilio => write!(f, "twilio"),
            Provider::Meta => write!(f, "meta"),
        }
    }
}

/// Raised when a `PROVIDER` value is neither "twilio" nor "meta".
#[derive(Debug, Error)]
#[error("unknown provider '{0}' (expected \"twilio\" or \"meta\")")]
pub struct ProviderParseError(pub String);

impl std::str::FromStr for Provider {
    type Err = ProviderParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "twilio" => Ok(Provider::Twilio),
            "meta" => Ok(Provider::Meta),
            other => Err(ProviderParseError(other.to_string())),
        }
    }
}

/// The fixed local wall-clock time at which the reminder fires.
///
/// Immutable after construction; the hour/minute pair is a valid wall-clock
/// time and the timezone is a resolved IANA zone (`Tz`), so every consumer
/// can trust the fields without revalidating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Target hour in local time (0-23).
    pub hour: u32,
    /// Target minute in local time (0-59).
    pub minute: u32,
    /// IANA timezone the wall-clock time is anchored to.
    pub timezone: Tz,
}

impl ScheduleConfig {
    /// Build a schedule, rejecting out-of-range wall-clock components.
    pub fn new(hour: u32, minute: u32, timezone: Tz) -> anyhow::Result<Self> {
        anyhow::ensure!(hour <= 23, "target hour must be 0-23, got {hour}");
        anyhow::ensure!(minute <= 59, "target minute must be 0-59, got {minute}");
        Ok(Self {
            hour,
            minute,
            timezone,
        })
    }

    /// Human-readable rendering for logs and diagnostics, e.g.
    /// "21:00 America/Argentina/Salta".
    pub fn local_label(&self) -> String {
        format!("{:02}:{:02} {}", self.hour, self.minute, self.timezone)
    }
}

/// Provider acknowledgement for one delivered message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    /// Provider that accepted the message.
    pub provider: Provider,
    /// Provider-assigned message identifier (Twilio SID, Meta message id).
    pub message_id: String,
    /// Provider-reported delivery status ("queued", "accepted", ...).
    pub status: String,
    /// Whether a pre-approved template was used instead of free-form text.
    pub used_template: bool,
    /// When the provider acknowledged the send.
    pub timestamp: DateTime<Utc>,
}

/// Terminal result of one send call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Success { provider_message_id: String },
    Failure { kind: String, detail: String },
}

/// Ephemeral record of one send call, created per attempt for logging only.
/// Never persisted; a restart loses nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryAttempt {
    pub id: Uuid,
    pub recipient: String,
    pub body: String,
    pub provider: Provider,
    pub timestamp_utc: DateTime<Utc>,
    pub outcome: DeliveryOutcome,
}
