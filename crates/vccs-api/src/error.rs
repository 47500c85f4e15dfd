use thiserror::Error;

/// Top-level error type for the `vccs-api` crate.
///
/// Covers every failure mode of the backend link: the websocket itself,
/// decoding of inbound frames, and fetching the facility document.
/// `vccs-core` maps these into session-level diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── WebSocket ───────────────────────────────────────────────────
    /// WebSocket connection failed.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// WebSocket closed unexpectedly.
    #[error("WebSocket closed (code {code}): {reason}")]
    WebSocketClosed { code: u16, reason: String },

    /// Opening the connection took longer than the configured timeout.
    #[error("Connection attempt timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error while fetching a remote document.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Data ────────────────────────────────────────────────────────
    /// An inbound frame could not be decoded, with the raw text for debugging.
    #[error("Decode error: {message}")]
    Decode { message: String, body: String },

    /// A recognized message arrived without a field it requires.
    #[error("'{kind}' message is missing '{field}'")]
    MissingField { kind: String, field: &'static str },

    /// An outbound record could not be encoded.
    #[error("Encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::WebSocketConnect(_) | Self::WebSocketClosed { .. } | Self::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if this error came from a malformed payload.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::MissingField { .. })
    }
}
