//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use vccs_config::ConfigError;
use vccs_core::{CoreError, DialError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to backend at {url}")]
    #[diagnostic(
        code(vccs::connection_failed),
        help(
            "Check that the backend is running and accepting websocket connections.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Timed out after {timeout_ms}ms")]
    #[diagnostic(code(vccs::timeout))]
    Timeout { timeout_ms: u64 },

    #[error("Protocol error: {message}")]
    #[diagnostic(code(vccs::protocol))]
    Protocol { message: String },

    #[error("Session closed")]
    #[diagnostic(code(vccs::session_closed))]
    SessionClosed,

    // ── Facility document ────────────────────────────────────────────
    #[error("Facility document error: {message}")]
    #[diagnostic(
        code(vccs::facility),
        help("Check the --facilities path or URL, or the profile's `facilities` entry.")
    )]
    Facility { message: String },

    #[error("Position '{callsign}' not found")]
    #[diagnostic(
        code(vccs::position_not_found),
        help("Run: vccs positions to see available callsigns")
    )]
    PositionNotFound { callsign: String },

    #[error(transparent)]
    #[diagnostic(
        code(vccs::dial),
        help("Check the trunk name and code against the facility's dial-code tables.")
    )]
    Dial(#[from] DialError),

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(vccs::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(vccs::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: vccs config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No backend configured")]
    #[diagnostic(
        code(vccs::no_config),
        help(
            "Create a profile with: vccs config init\n\
             Or pass --backend and --facilities.\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(vccs::config))]
    Config(Box<ConfigError>),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(vccs::json))]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(vccs::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::SessionClosed => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::PositionNotFound { .. } | Self::Dial(_) | Self::ProfileNotFound { .. } => {
                exit_code::NOT_FOUND
            }
            Self::Validation { .. } | Self::NoConfig { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::Timeout { timeout_ms } => Self::Timeout { timeout_ms },
            CoreError::Facility { message } => Self::Facility { message },
            CoreError::Decode { message } => Self::Protocol { message },
            CoreError::Dial(err) => Self::Dial(err),
            CoreError::SessionClosed => Self::SessionClosed,
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::UnknownProfile { profile } => Self::ProfileNotFound {
                name: profile,
                available: String::new(),
            },
            other => Self::Config(Box::new(other)),
        }
    }
}
