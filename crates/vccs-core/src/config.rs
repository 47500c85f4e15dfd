// ── Runtime session configuration ──
//
// Describes *how* a session connects and behaves. Never touches disk:
// the CLI (or any embedder) builds a `SessionConfig` and hands it in.

use std::time::Duration;

use strum::{Display, EnumString};
use url::Url;
use vccs_api::ReconnectConfig;
use vccs_api::transport::TransportConfig;

use crate::model::FacilitySource;

/// Which override-line statuses count as "being overridden".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum OverrideRule {
    /// `ok` or `active`.
    #[default]
    Lenient,
    /// `ok`, `active` or `hold`.
    Strict,
}

impl OverrideRule {
    pub fn from_strict(strict: bool) -> Self {
        if strict { Self::Strict } else { Self::Lenient }
    }

    pub fn is_overriding(self, status: &str) -> bool {
        match status {
            "ok" | "active" => true,
            "hold" => self == Self::Strict,
            _ => false,
        }
    }
}

/// Configuration for one operator session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Backend websocket endpoint (e.g., `ws://127.0.0.1:9002`).
    pub backend_url: Url,
    /// Startup facility document.
    pub facilities: FacilitySource,
    /// Callsigns selected at startup. The first one is the primary position.
    pub positions: Vec<String>,
    pub reconnect: ReconnectConfig,
    /// HTTP settings for a remote facility document.
    pub transport: TransportConfig,
    /// Delay between a bootstrap and its follow-up `sync`. Default: 4s.
    pub sync_delay: Duration,
    /// Coalescing window of the state publisher. Default: 50ms.
    pub debounce_window: Duration,
    pub override_rule: OverrideRule,
}

impl SessionConfig {
    pub const DEFAULT_SYNC_DELAY: Duration = Duration::from_secs(4);
    pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(50);

    pub fn new(backend_url: Url, facilities: FacilitySource) -> Self {
        Self {
            backend_url,
            facilities,
            positions: Vec::new(),
            reconnect: ReconnectConfig::default(),
            transport: TransportConfig::default(),
            sync_delay: Self::DEFAULT_SYNC_DELAY,
            debounce_window: Self::DEFAULT_DEBOUNCE_WINDOW,
            override_rule: OverrideRule::default(),
        }
    }

    pub fn with_positions(mut self, positions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.positions = positions.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn override_rules() {
        for status in ["ok", "active"] {
            assert!(OverrideRule::Lenient.is_overriding(status));
            assert!(OverrideRule::Strict.is_overriding(status));
        }
        assert!(!OverrideRule::Lenient.is_overriding("hold"));
        assert!(OverrideRule::Strict.is_overriding("hold"));
        assert!(!OverrideRule::Strict.is_overriding("idle"));
        assert_eq!(OverrideRule::from_strict(true), OverrideRule::Strict);
    }

    #[test]
    fn defaults() {
        let url = Url::parse("ws://127.0.0.1:9002").unwrap();
        let config = SessionConfig::new(url, FacilitySource::parse("zoa.json"))
            .with_positions(["OAK_40_CTR"]);
        assert_eq!(config.sync_delay, Duration::from_secs(4));
        assert_eq!(config.debounce_window, Duration::from_millis(50));
        assert_eq!(config.positions, ["OAK_40_CTR"]);
        assert_eq!(config.override_rule, OverrideRule::Lenient);
    }
}
