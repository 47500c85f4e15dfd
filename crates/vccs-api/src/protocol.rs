//! Wire records exchanged with the voice backend.
//!
//! Every JSON message is a small tagged record:
//! `{ "type": "...", "cmd1": "...", "cmd2": "...", "dbl1": 1 | true }`.
//! Messages that carry a structured payload (`channel_status`, `facility`)
//! nest it as JSON text inside `cmd1`. Two bare text frames, which are not
//! JSON at all, toggle the transmit key.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Bare text frame sent by the backend when the transmit key goes down.
pub const TRANSMIT_KEY_DOWN: &str = "PTT_ON";

/// Bare text frame sent by the backend when the transmit key is released.
pub const TRANSMIT_KEY_UP: &str = "PTT_OFF";

// ── WireMessage ──────────────────────────────────────────────────────

/// The raw tagged record as it travels over the websocket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmd1: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmd2: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dbl1: Option<Dbl>,
}

impl WireMessage {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            cmd1: None,
            cmd2: None,
            dbl1: None,
        }
    }

    pub fn with_cmd1(mut self, value: impl Into<String>) -> Self {
        self.cmd1 = Some(value.into());
        self
    }

    pub fn with_cmd2(mut self, value: impl Into<String>) -> Self {
        self.cmd2 = Some(value.into());
        self
    }

    pub fn with_dbl1(mut self, value: impl Into<Dbl>) -> Self {
        self.dbl1 = Some(value.into());
        self
    }
}

/// The `dbl1` slot: a number or a boolean depending on the message type.
///
/// Integers are kept apart from floats so that line types and ids encode
/// as `1` rather than `1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dbl {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl Dbl {
    /// Interpret the slot as a non-negative whole number.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss,
        clippy::as_conversions
    )]
    pub fn as_u64(self) -> Option<u64> {
        match self {
            Self::Int(n) => u64::try_from(n).ok(),
            Self::Float(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f < u64::MAX as f64 => {
                Some(f as u64)
            }
            Self::Float(_) | Self::Bool(_) => None,
        }
    }

    /// Interpret the slot as a flag. Numbers follow the C convention.
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(b),
            Self::Int(n) => Some(n != 0),
            Self::Float(_) => None,
        }
    }
}

impl From<bool> for Dbl {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Dbl {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u8> for Dbl {
    fn from(value: u8) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u64> for Dbl {
    fn from(value: u64) -> Self {
        Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

// ── ChannelStatusEvent ───────────────────────────────────────────────

/// One entry of a `channel_status` batch.
///
/// `call` encodes both the subsystem and the line id through a prefix
/// convention (`A/G`, `SO_`, `OV_`, `VSCS_`, or a plain G/G prefix).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelStatusEvent {
    pub call: String,

    pub status: String,

    /// Radio frequency in Hz, present on air-ground entries. Fractional
    /// values are rounded; anything unusable reads as absent.
    #[serde(
        default,
        deserialize_with = "lenient_freq",
        skip_serializing_if = "Option::is_none"
    )]
    pub freq: Option<u64>,

    /// Receive enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r: Option<bool>,

    /// Transmit enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<bool>,

    /// Routed to headset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub talking: Option<bool>,
}

impl ChannelStatusEvent {
    pub fn new(call: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            call: call.into(),
            status: status.into(),
            freq: None,
            r: None,
            t: None,
            h: None,
            talking: None,
        }
    }
}

/// One odd entry must not fail the whole batch.
fn lenient_freq<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(|v| Dbl::deserialize(v).ok())
        .and_then(|dbl| match dbl {
            Dbl::Float(f) => Dbl::Float(f.round()).as_u64(),
            other => other.as_u64(),
        }))
}

// ── Inbound ──────────────────────────────────────────────────────────

/// A decoded message from the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Backend version announcement.
    Version(String),
    /// An incoming call notification.
    Call { call: String },
    /// Full snapshot of every tracked line and frequency.
    ChannelStatus(Vec<ChannelStatusEvent>),
    /// Identity announcement for the logged-in operator.
    CallSign { callsign: String, id: Option<u64> },
    /// Voice activity started on a frequency.
    CallBegin { freq: u64 },
    /// Voice activity ended on a frequency.
    CallEnd { freq: u64 },
    /// Replacement facility document (still untyped at this layer).
    Facility(serde_json::Value),
    /// Progress of a previously sent `dial_call`.
    DialCallStatus(String),
    /// Transmit key pressed (`true`) or released (`false`).
    TransmitKey(bool),
    /// A well-formed record of a type this client does not interpret.
    Other(WireMessage),
}

/// Decode one websocket text frame.
pub fn decode(text: &str) -> Result<Inbound, Error> {
    match text.trim() {
        TRANSMIT_KEY_DOWN => return Ok(Inbound::TransmitKey(true)),
        TRANSMIT_KEY_UP => return Ok(Inbound::TransmitKey(false)),
        _ => {}
    }

    let message: WireMessage =
        serde_json::from_str(text).map_err(|e| decode_error(&e, text))?;
    Inbound::try_from(message)
}

impl TryFrom<WireMessage> for Inbound {
    type Error = Error;

    fn try_from(message: WireMessage) -> Result<Self, Self::Error> {
        let inbound = match message.kind.as_str() {
            "version" => Self::Version(message.cmd1.unwrap_or_default()),
            "call" => Self::Call {
                call: require_cmd1(&message)?.to_owned(),
            },
            "channel_status" => {
                let body = require_cmd1(&message)?;
                let batch = serde_json::from_str(body).map_err(|e| decode_error(&e, body))?;
                Self::ChannelStatus(batch)
            }
            "call_sign" => Self::CallSign {
                callsign: require_cmd1(&message)?.to_owned(),
                id: message.dbl1.and_then(Dbl::as_u64),
            },
            "call_begin" => Self::CallBegin {
                freq: require_freq(&message)?,
            },
            "call_end" => Self::CallEnd {
                freq: require_freq(&message)?,
            },
            "facility" => {
                let body = require_cmd1(&message)?;
                let doc = serde_json::from_str(body).map_err(|e| decode_error(&e, body))?;
                Self::Facility(doc)
            }
            "dial_call_status" => Self::DialCallStatus(require_cmd1(&message)?.to_owned()),
            _ => Self::Other(message),
        };
        Ok(inbound)
    }
}

fn require_cmd1(message: &WireMessage) -> Result<&str, Error> {
    message.cmd1.as_deref().ok_or_else(|| Error::MissingField {
        kind: message.kind.clone(),
        field: "cmd1",
    })
}

/// Frequencies travel in `dbl1`; some backends put them in `cmd1` as text.
fn require_freq(message: &WireMessage) -> Result<u64, Error> {
    message
        .dbl1
        .and_then(Dbl::as_u64)
        .or_else(|| message.cmd1.as_deref().and_then(|s| s.trim().parse().ok()))
        .ok_or_else(|| Error::MissingField {
            kind: message.kind.clone(),
            field: "dbl1",
        })
}

fn decode_error(err: &serde_json::Error, body: &str) -> Error {
    Error::Decode {
        message: err.to_string(),
        body: body.to_owned(),
    }
}

// ── Outbound ─────────────────────────────────────────────────────────

/// A command sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Register a line for this session.
    AddLine { line_id: String, line_type: u8 },
    /// Register the identity-linked auxiliary line.
    AddIdentity { id: u64 },
    /// Drop every registration of the previous session.
    ClearSession,
    /// Request a full state snapshot.
    Sync,
    /// Originate or answer a call.
    Call { call: String },
    /// Terminate or hang up a call.
    Stop { call: String },
    Transmit { freq: u64, enabled: bool },
    Receive { freq: u64, enabled: bool },
    Headset { freq: u64, enabled: bool },
    /// Originate a call to a resolved dial-code target.
    DialCall { target: String, trunk: String },
}

impl Outbound {
    /// The wire `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AddLine { .. } => "add",
            Self::AddIdentity { .. } => "add_ia",
            Self::ClearSession => "del",
            Self::Sync => "sync",
            Self::Call { .. } => "call",
            Self::Stop { .. } => "stop",
            Self::Transmit { .. } => "tx",
            Self::Receive { .. } => "rx",
            Self::Headset { .. } => "set_hs",
            Self::DialCall { .. } => "dial_call",
        }
    }

    pub fn to_wire(&self) -> WireMessage {
        let message = WireMessage::new(self.kind());
        match self {
            Self::AddLine { line_id, line_type } => {
                message.with_cmd1(line_id.as_str()).with_dbl1(*line_type)
            }
            Self::AddIdentity { id } => message.with_cmd1(id.to_string()).with_dbl1(*id),
            Self::ClearSession | Self::Sync => message,
            Self::Call { call } | Self::Stop { call } => message.with_cmd1(call.as_str()),
            Self::Transmit { freq, enabled }
            | Self::Receive { freq, enabled }
            | Self::Headset { freq, enabled } => {
                message.with_cmd1(freq.to_string()).with_dbl1(*enabled)
            }
            Self::DialCall { target, trunk } => {
                message.with_cmd1(target.as_str()).with_cmd2(trunk.as_str())
            }
        }
    }

    /// Serialize to the JSON text frame.
    pub fn encode(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(&self.to_wire())?)
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn bare_transmit_signals_toggle_key() {
        assert_eq!(decode("PTT_ON").unwrap(), Inbound::TransmitKey(true));
        assert_eq!(decode("PTT_OFF\n").unwrap(), Inbound::TransmitKey(false));
    }

    #[test]
    fn channel_status_payload_is_nested_json() {
        let batch = json!([
            { "call": "A/G", "status": "ok", "freq": 118_300_000, "r": true, "t": false },
            { "call": "gg_100", "status": "chime" }
        ]);
        let frame = json!({ "type": "channel_status", "cmd1": batch.to_string() });

        let Inbound::ChannelStatus(events) = decode(&frame.to_string()).unwrap() else {
            panic!("expected a channel_status batch");
        };
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].freq, Some(118_300_000));
        assert_eq!(events[0].r, Some(true));
        assert_eq!(events[1].call, "gg_100");
        assert_eq!(events[1].talking, None);
    }

    #[test]
    fn channel_status_tolerates_odd_frequencies() {
        let batch = json!([
            { "call": "A/G", "status": "ok", "freq": 118.3, "r": true },
            { "call": "A/G", "status": "ok", "freq": 121_500_000.4 },
            { "call": "A/G", "status": "ok", "freq": "guard" },
            { "call": "A/G", "status": "ok", "freq": -1 },
            { "call": "gg_100", "status": "chime" }
        ]);
        let frame = json!({ "type": "channel_status", "cmd1": batch.to_string() });

        let Inbound::ChannelStatus(events) = decode(&frame.to_string()).unwrap() else {
            panic!("expected a channel_status batch");
        };
        assert_eq!(events.len(), 5);
        assert_eq!(events[0].freq, Some(118));
        assert_eq!(events[0].r, Some(true));
        assert_eq!(events[1].freq, Some(121_500_000));
        assert_eq!(events[2].freq, None);
        assert_eq!(events[3].freq, None);
        assert_eq!(events[4].call, "gg_100");
    }

    #[test]
    fn call_sign_carries_numeric_id() {
        let frame = r#"{"type":"call_sign","cmd1":"OAK_40_CTR","dbl1":1234567.0}"#;
        assert_eq!(
            decode(frame).unwrap(),
            Inbound::CallSign {
                callsign: "OAK_40_CTR".into(),
                id: Some(1_234_567),
            }
        );
    }

    #[test]
    fn call_begin_accepts_frequency_in_either_slot() {
        let numeric = r#"{"type":"call_begin","dbl1":124350000}"#;
        let textual = r#"{"type":"call_end","cmd1":"124350000"}"#;
        assert_eq!(decode(numeric).unwrap(), Inbound::CallBegin { freq: 124_350_000 });
        assert_eq!(decode(textual).unwrap(), Inbound::CallEnd { freq: 124_350_000 });
    }

    #[test]
    fn missing_payload_is_reported() {
        let err = decode(r#"{"type":"channel_status"}"#).unwrap_err();
        assert!(matches!(err, Error::MissingField { field: "cmd1", .. }));
        assert!(err.is_decode());
    }

    #[test]
    fn malformed_frames_are_decode_errors() {
        let err = decode("not json at all").unwrap_err();
        let Error::Decode { body, .. } = err else {
            panic!("expected a decode error");
        };
        assert_eq!(body, "not json at all");

        let bad_batch = json!({ "type": "channel_status", "cmd1": "[{\"call\": 5}]" });
        assert!(decode(&bad_batch.to_string()).unwrap_err().is_decode());
    }

    #[test]
    fn unknown_types_pass_through() {
        let frame = r#"{"type":"heartbeat","cmd1":"x"}"#;
        let Inbound::Other(message) = decode(frame).unwrap() else {
            panic!("expected passthrough");
        };
        assert_eq!(message.kind, "heartbeat");
        assert_eq!(message.cmd1.as_deref(), Some("x"));
    }

    #[test]
    fn outbound_records_encode_compactly() {
        let add = Outbound::AddLine {
            line_id: "100".into(),
            line_type: 1,
        };
        let value: serde_json::Value = serde_json::from_str(&add.encode().unwrap()).unwrap();
        assert_eq!(value, json!({ "type": "add", "cmd1": "100", "dbl1": 1 }));

        let sync: serde_json::Value =
            serde_json::from_str(&Outbound::Sync.encode().unwrap()).unwrap();
        assert_eq!(sync, json!({ "type": "sync" }));

        let tx = Outbound::Transmit {
            freq: 118_300_000,
            enabled: true,
        };
        assert_eq!(
            tx.to_wire(),
            WireMessage::new("tx").with_cmd1("118300000").with_dbl1(true)
        );

        let dial = Outbound::DialCall {
            target: "OAK_40_CTR".into(),
            trunk: "APCH".into(),
        };
        assert_eq!(dial.to_wire().cmd2.as_deref(), Some("APCH"));
    }

    #[test]
    fn dial_call_wire_shape() {
        let dial = Outbound::DialCall {
            target: "OAK_40_CTR".into(),
            trunk: "APCH".into(),
        };
        insta::assert_json_snapshot!(dial.to_wire(), @r#"
        {
          "type": "dial_call",
          "cmd1": "OAK_40_CTR",
          "cmd2": "APCH"
        }
        "#);

        let identity = Outbound::AddIdentity { id: 1_234_567 };
        insta::assert_json_snapshot!(identity.to_wire(), @r#"
        {
          "type": "add_ia",
          "cmd1": "1234567",
          "dbl1": 1234567
        }
        "#);
    }

    #[test]
    fn dbl_conversions() {
        assert_eq!(Dbl::Float(42.0).as_u64(), Some(42));
        assert_eq!(Dbl::Float(42.5).as_u64(), None);
        assert_eq!(Dbl::Int(-1).as_u64(), None);
        assert_eq!(Dbl::Bool(true).as_u64(), None);
        assert_eq!(Dbl::Int(0).as_bool(), Some(false));
        assert_eq!(Dbl::from(7_u8), Dbl::Int(7));
    }
}
