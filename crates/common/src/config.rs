use std::path::PathBuf;

use chrono_tz::Tz;
use serde::Deserialize;

use crate::types::{Provider, ScheduleConfig};

/// Global application configuration loaded from environment variables.
///
/// Schedule fields (hour, minute, timezone) are structural and validated
/// here, so a bad value fails the process at boot. Provider credentials and
/// the recipient stay optional: they are validated at send-time so the HTTP
/// facade still boots and reports diagnostics with incomplete configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Active delivery provider, selected once at startup
    pub provider: Provider,

    /// Recipient identifier (Twilio: "whatsapp:+549...", Meta: digits only)
    pub to_number: Option<String>,

    /// Twilio account SID
    pub twilio_account_sid: Option<String>,

    /// Twilio auth token
    pub twilio_auth_token: Option<String>,

    /// Twilio sender, usually the sandbox number ("whatsapp:+14155238886")
    pub twilio_from_number: Option<String>,

    /// Meta WhatsApp Business access token
    pub meta_access_token: Option<String>,

    /// Meta phone number id the message is sent from
    pub meta_phone_number_id: Option<String>,

    /// Graph API version used for Meta calls (default: v21.0)
    pub meta_api_version: String,

    /// Send via pre-approved template instead of free-form text (needed
    /// outside the 24h messaging window)
    pub meta_use_template: bool,

    /// Operator-supplied message appended to the built-in catalog
    pub message_text: Option<String>,

    /// Daily fire time: local wall-clock hour/minute in an IANA zone
    pub schedule: ScheduleConfig,

    /// HTTP listen port (default: 3000)
    pub port: u16,

    /// Fire one test send shortly after boot (default: false)
    pub startup_test_send: bool,

    /// Best-effort error log file appended to on failed sends
    pub error_log_path: PathBuf,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let provider = match std::env::var("PROVIDER") {
            Ok(raw) => match raw.parse::<Provider>() {
                Ok(provider) => provider,
                Err(e) => {
                    tracing::warn!(error = %e, "PROVIDER not recognized, falling back to twilio");
                    Provider::Twilio
                }
            },
            Err(_) => Provider::Twilio,
        };

        let hour: u32 = std::env::var("TARGET_HOUR")
            .unwrap_or_else(|_| "21".to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("TARGET_HOUR must be a valid hour (0-23)"))?;
        let minute: u32 = std::env::var("TARGET_MINUTE")
            .unwrap_or_else(|_| "0".to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("TARGET_MINUTE must be a valid minute (0-59)"))?;
        let timezone_name =
            std::env::var("TIMEZONE").unwrap_or_else(|_| "America/Argentina/Salta".to_string());
        let timezone: Tz = timezone_name.parse().map_err(|_| {
            anyhow::anyhow!("TIMEZONE must be a valid IANA zone name, got '{timezone_name}'")
        })?;
        let schedule = ScheduleConfig::new(hour, minute, timezone)?;

        Ok(Self {
            provider,
            to_number: std::env::var("TO_NUMBER").ok(),
            twilio_account_sid: std::env::var("TWILIO_ACCOUNT_SID").ok(),
            twilio_auth_token: std::env::var("TWILIO_AUTH_TOKEN").ok(),
            twilio_from_number: std::env::var("TWILIO_SANDBOX_NUMBER").ok(),
            meta_access_token: std::env::var("META_ACCESS_TOKEN").ok(),
            meta_phone_number_id: std::env::var("META_PHONE_NUMBER_ID").ok(),
            meta_api_version: std::env::var("META_API_VERSION")
                .unwrap_or_else(|_| "v21.0".to_string()),
            meta_use_template: env_flag("META_USE_TEMPLATE"),
            message_text: std::env::var("MESSAGE_TEXT").ok(),
            schedule,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid u16"))?,
            startup_test_send: env_flag("STARTUP_TEST_SEND"),
            error_log_path: std::env::var("ERROR_LOG_PATH")
                .unwrap_or_else(|_| "logs/errors.log".to_string())
                .into(),
        })
    }
}

/// "true" enables the flag; anything else (or unset) leaves it off.
fn env_flag(name: &str) -> bool {
    matches!(std::env::var(name).as_deref(), Ok("true"))
}
