// ── Published console state ──
//
// The value observers receive from the debounced publisher. Every field
// is owned data; snapshots are shared as `Arc<ConsoleState>` and never
// mutated after publication.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::EnumString;
use vccs_api::ChannelStatusEvent;

use crate::classifier::CallKind;
use crate::config::OverrideRule;
use crate::model::LineType;

/// Operator identity announced by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub callsign: String,
    /// Numeric id used for the identity-linked auxiliary line.
    pub id: Option<u64>,
}

/// A G/G, override or VSCS status entry enriched from the call directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineStatus {
    /// Raw call identifier as received.
    pub call: String,
    pub kind: CallKind,
    /// Call identifier with its subsystem prefix stripped.
    pub line_id: String,
    /// Directory label, or the line id when the directory has no entry.
    pub label: String,
    /// `None` when the directory has no entry.
    pub line_type: Option<LineType>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub talking: Option<bool>,
}

/// One slot of the G/G panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "slot", rename_all = "snake_case")]
pub enum GgSlot {
    Placeholder,
    Line(LineStatus),
}

impl GgSlot {
    pub fn line(&self) -> Option<&LineStatus> {
        match self {
            Self::Placeholder => None,
            Self::Line(status) => Some(status),
        }
    }
}

/// Progress of the last dial-code call.
///
/// Backend progress strings that are not listed here are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DialStatus {
    #[default]
    Idle,
    Dialing,
    Ringing,
    Connected,
    Busy,
    /// Local resolution failed or the backend rejected the call.
    Error,
    #[strum(default)]
    Other(String),
}

impl DialStatus {
    pub fn parse(text: &str) -> Self {
        Self::from_str(text.trim()).unwrap_or_else(|_| Self::Other(text.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Idle => "idle",
            Self::Dialing => "dialing",
            Self::Ringing => "ringing",
            Self::Connected => "connected",
            Self::Busy => "busy",
            Self::Error => "error",
            Self::Other(text) => text,
        }
    }
}

impl fmt::Display for DialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a console view renders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConsoleState {
    pub identity: Option<Identity>,
    /// Selected callsigns, primary first.
    pub positions: Vec<String>,

    // ── Latest channel status, per bucket ──
    pub ag: Vec<ChannelStatusEvent>,
    pub gg: Vec<GgSlot>,
    pub vscs: Vec<LineStatus>,
    pub overrides: Vec<LineStatus>,

    // ── Transient signals ──
    pub transmit_key: bool,
    /// Frequencies with voice activity, in Hz.
    pub talking: BTreeSet<u64>,
    pub dial_status: DialStatus,
    pub version: Option<String>,
    pub last_call: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(skip)]
    pub override_rule: OverrideRule,
}

impl ConsoleState {
    /// Whether another position is currently overriding this one.
    pub fn overridden(&self) -> bool {
        self.overrides
            .iter()
            .any(|entry| self.override_rule.is_overriding(&entry.status))
    }

    /// G/G lines, placeholders skipped.
    pub fn gg_lines(&self) -> impl Iterator<Item = &LineStatus> {
        self.gg.iter().filter_map(GgSlot::line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn override_entry(status: &str) -> LineStatus {
        LineStatus {
            call: "OV_300".into(),
            kind: CallKind::Override,
            line_id: "300".into(),
            label: "300".into(),
            line_type: None,
            status: status.into(),
            talking: None,
        }
    }

    #[test]
    fn dial_status_keeps_unknown_progress_verbatim() {
        assert_eq!(DialStatus::parse("dialing"), DialStatus::Dialing);
        assert_eq!(DialStatus::parse("error"), DialStatus::Error);
        assert_eq!(
            DialStatus::parse("queued"),
            DialStatus::Other("queued".into())
        );
        assert_eq!(DialStatus::Other("queued".into()).to_string(), "queued");
        assert_eq!(DialStatus::default().to_string(), "idle");
    }

    #[test]
    fn overridden_follows_rule() {
        let mut state = ConsoleState {
            overrides: vec![override_entry("hold")],
            ..ConsoleState::default()
        };
        assert!(!state.overridden());

        state.override_rule = OverrideRule::Strict;
        assert!(state.overridden());

        state.overrides = vec![override_entry("idle"), override_entry("active")];
        state.override_rule = OverrideRule::Lenient;
        assert!(state.overridden());
    }
}
