// ── Core error types ──
//
// Errors surfaced by the session engine. Transport faults from vccs-api
// are folded into domain variants by the `From` impl below; consumers
// never match on websocket or HTTP specifics.

use thiserror::Error;

use crate::dial::DialError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Backend connection timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Invalid facility document: {message}")]
    Facility { message: String },

    #[error("Malformed backend data: {message}")]
    Decode { message: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error(transparent)]
    Dial(#[from] DialError),

    #[error("Session is not running")]
    SessionClosed,

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<vccs_api::Error> for CoreError {
    fn from(err: vccs_api::Error) -> Self {
        match err {
            vccs_api::Error::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                url: "<backend>".into(),
                reason,
            },
            vccs_api::Error::WebSocketClosed { code, reason } => CoreError::ConnectionFailed {
                url: "<backend>".into(),
                reason: format!("closed with code {code}: {reason}"),
            },
            vccs_api::Error::Timeout { timeout_ms } => CoreError::Timeout { timeout_ms },
            vccs_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_ms: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Facility {
                        message: e.to_string(),
                    }
                }
            }
            vccs_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid URL: {e}"),
            },
            vccs_api::Error::Decode { message, .. } => CoreError::Decode { message },
            vccs_api::Error::MissingField { kind, field } => CoreError::Decode {
                message: format!("'{kind}' message is missing {field}"),
            },
            vccs_api::Error::Encode(e) => CoreError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_map_to_domain_variants() {
        let timeout: CoreError = vccs_api::Error::Timeout { timeout_ms: 500 }.into();
        assert!(matches!(timeout, CoreError::Timeout { timeout_ms: 500 }));

        let missing: CoreError = vccs_api::Error::MissingField {
            kind: "facility".into(),
            field: "cmd1",
        }
        .into();
        assert_eq!(
            missing.to_string(),
            "Malformed backend data: 'facility' message is missing cmd1"
        );
    }
}
