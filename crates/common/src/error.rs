use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Closed classification of send failures.
///
/// Every provider-specific error code is mapped into one of these variants
/// before it crosses a crate boundary; raw provider errors never leak to
/// callers. `UnknownProvider` is the catch-all and is logged verbatim,
/// never assumed benign.
#[derive(Debug, Error)]
pub enum SendError {
    /// A required credential/recipient/timezone field is missing or invalid.
    /// Checked before any network I/O; never retried.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The provider rejects the recipient as unverified or not opted in
    /// (sandbox gating).
    #[error("Recipient not registered with the provider: {0}")]
    RecipientNotRegistered(String),

    /// Malformed phone/number identifier.
    #[error("Invalid recipient format: {0}")]
    InvalidRecipient(String),

    /// The provider rejects the credentials.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Quota or messaging-window exhaustion, including a closed 24h window
    /// that requires a pre-approved template.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// The provider did not answer within the send timeout.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Transport-level failure before a provider response arrived.
    #[error("Network error: {0}")]
    Network(String),

    /// Another send is still in progress; the single-flight guard rejected
    /// this one to avoid duplicate deliveries.
    #[error("A send is already in flight")]
    AlreadyInFlight,

    /// Anything the provider returned that fits no other class.
    #[error("Unknown provider error: {0}")]
    UnknownProvider(String),
}

impl SendError {
    /// Stable machine-readable classification string.
    pub fn classification(&self) -> &'static str {
        match self {
            SendError::Config(_) => "configuration_error",
            SendError::RecipientNotRegistered(_) => "recipient_not_registered",
            SendError::InvalidRecipient(_) => "invalid_recipient_format",
            SendError::Auth(_) => "authentication_error",
            SendError::RateLimited(_) => "rate_limited",
            SendError::Timeout(_) => "timeout",
            SendError::Network(_) => "network_error",
            SendError::AlreadyInFlight => "already_in_flight",
            SendError::UnknownProvider(_) => "unknown_provider_error",
        }
    }

    /// Operator-facing remediation hint surfaced next to the error.
    pub fn remediation(&self) -> &'static str {
        match self {
            SendError::Config(_) => {
                "Set the environment variable named in the error and restart or retry"
            }
            SendError::RecipientNotRegistered(_) => {
                "Have the recipient opt in first. Twilio sandbox: send the \
                 'join <sandbox-keyword>' message to the sandbox number from \
                 the recipient's WhatsApp. Meta: register the number as a \
                 tester for the business account"
            }
            SendError::InvalidRecipient(_) => {
                "Use E.164 format: 'whatsapp:+5493875000000' for Twilio, \
                 '5493875000000' for Meta"
            }
            SendError::Auth(_) => {
                "Verify TWILIO_ACCOUNT_SID / TWILIO_AUTH_TOKEN (or \
                 META_ACCESS_TOKEN); tokens may have been rotated or expired"
            }
            SendError::RateLimited(_) => {
                "Wait before retrying. If the 24h messaging window is closed, \
                 set META_USE_TEMPLATE=true and use a pre-approved template"
            }
            SendError::Timeout(_) => {
                "The provider did not answer within the send timeout. Check \
                 connectivity and retry"
            }
            SendError::Network(_) => "Check outbound network access and DNS, then retry",
            SendError::AlreadyInFlight => {
                "Another send is still running. Wait for it to finish and retry"
            }
            SendError::UnknownProvider(_) => {
                "Inspect the full provider response in the logs before retrying"
            }
        }
    }
}

impl IntoResponse for SendError {
    fn into_response(self) -> Response {
        let status = match &self {
            SendError::AlreadyInFlight => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = json!({
            "success": false,
            "error": self.classification(),
            "detail": self.to_string(),
            "remediation": self.remediation(),
        });
        (status, Json(body)).into_response()
    }
}

/// Facade-level errors raised by route handlers themselves.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Send(#[from] SendError),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Send(e) => e.into_response(),
            ApiError::Validation(msg) => {
                let body = json!({ "error": msg });
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_detail() {
        let err = SendError::Auth("Twilio 20003: authenticate".to_string());
        assert_eq!(
            err.to_string(),
            "Authentication error: Twilio 20003: authenticate"
        );
    }

    #[test]
    fn test_classification_strings_are_stable() {
        assert_eq!(
            SendError::Config("TO_NUMBER".into()).classification(),
            "configuration_error"
        );
        assert_eq!(
            SendError::RecipientNotRegistered("x".into()).classification(),
            "recipient_not_registered"
        );
        assert_eq!(
            SendError::Timeout("10s".into()).classification(),
            "timeout"
        );
        assert_eq!(
            SendError::AlreadyInFlight.classification(),
            "already_in_flight"
        );
    }

    #[test]
    fn test_unregistered_remediation_mentions_sandbox_join() {
        let err = SendError::RecipientNotRegistered("21608".to_string());
        assert!(err.remediation().contains("join"));
    }

    #[test]
    fn test_already_in_flight_maps_to_conflict() {
        let response = SendError::AlreadyInFlight.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_delivery_failures_map_to_internal_error() {
        let response = SendError::Network("connection refused".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_missing_param_maps_to_bad_request() {
        let response = ApiError::Validation("missing 'mensaje'".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SendError>();
        assert_send_sync::<ApiError>();
    }
}
