//! Shared configuration for vccs tools.
//!
//! TOML profiles merged with `VCCS_`-prefixed environment variables, and
//! translation to `vccs_core::SessionConfig`. The CLI layers its own flag
//! overrides on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use vccs_core::{FacilitySource, OverrideRule, ReconnectConfig, SessionConfig};

/// Environment variable that points at an alternative config file.
pub const CONFIG_PATH_ENV: &str = "VCCS_CONFIG";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{profile}' is not defined")]
    UnknownProfile { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Pick the profile to use: an explicit name, else `default_profile`,
    /// else `"default"`.
    pub fn profile_name(&self, explicit: Option<&str>) -> String {
        explicit
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile {
                profile: name.into(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default = "default_sync_delay_ms")]
    pub sync_delay_ms: u64,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Count `hold` on an override line as being overridden.
    #[serde(default)]
    pub strict_override: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            reconnect_interval_ms: default_reconnect_interval_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            sync_delay_ms: default_sync_delay_ms(),
            debounce_ms: default_debounce_ms(),
            strict_override: false,
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_reconnect_interval_ms() -> u64 {
    1_000
}
fn default_connect_timeout_ms() -> u64 {
    10_000
}
fn default_sync_delay_ms() -> u64 {
    4_000
}
fn default_debounce_ms() -> u64 {
    50
}

/// A named backend profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Backend websocket URL (e.g., "ws://127.0.0.1:9002").
    pub backend: String,

    /// Facility document: a local path or an http(s) URL.
    pub facilities: String,

    /// Callsigns selected at startup, primary first.
    #[serde(default)]
    pub positions: Vec<String>,

    /// Override the reconnect poll interval.
    pub reconnect_interval_ms: Option<u64>,

    /// Override the deferred sync delay.
    pub sync_delay_ms: Option<u64>,

    /// Override the publish debounce window.
    pub debounce_ms: Option<u64>,

    /// Override the override-line rule.
    pub strict_override: Option<bool>,
}

impl Profile {
    pub fn new(backend: impl Into<String>, facilities: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            facilities: facilities.into(),
            positions: Vec::new(),
            reconnect_interval_ms: None,
            sync_delay_ms: None,
            debounce_ms: None,
            strict_override: None,
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `$VCCS_CONFIG`, else XDG / platform
/// conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("org", "vccs", "vccs").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("vccs");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from `path` + environment.
///
/// Nested keys use a double underscore: `VCCS_DEFAULTS__DEBOUNCE_MS=20`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("VCCS_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `SessionConfig` from a profile and the global defaults.
pub fn profile_to_session_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<SessionConfig, ConfigError> {
    let backend_url: url::Url = profile
        .backend
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "backend".into(),
            reason: format!("invalid URL: {}", profile.backend),
        })?;
    if !matches!(backend_url.scheme(), "ws" | "wss") {
        return Err(ConfigError::Validation {
            field: "backend".into(),
            reason: format!("expected a ws:// or wss:// URL, got {backend_url}"),
        });
    }
    if profile.facilities.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "facilities".into(),
            reason: "no facility document configured".into(),
        });
    }

    let mut config = SessionConfig::new(backend_url, FacilitySource::parse(&profile.facilities))
        .with_positions(profile.positions.iter().cloned());

    config.reconnect = ReconnectConfig {
        poll_interval: Duration::from_millis(
            profile
                .reconnect_interval_ms
                .unwrap_or(defaults.reconnect_interval_ms),
        ),
        connect_timeout: Duration::from_millis(defaults.connect_timeout_ms),
    };
    config.sync_delay =
        Duration::from_millis(profile.sync_delay_ms.unwrap_or(defaults.sync_delay_ms));
    config.debounce_window =
        Duration::from_millis(profile.debounce_ms.unwrap_or(defaults.debounce_ms));
    config.override_rule =
        OverrideRule::from_strict(profile.strict_override.unwrap_or(defaults.strict_override));

    Ok(config)
}
