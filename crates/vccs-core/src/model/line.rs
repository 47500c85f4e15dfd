// ── Line definitions ──
//
// A position's panel is a list of slots. Each slot is either a line
// triple `[id, type, label]` or an empty array marking a deliberate gap.

use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumString};

/// Call semantics of a line. Closed set, encoded on the wire as `0..=3`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, Serialize,
    Deserialize,
)]
#[serde(try_from = "LineTypeRepr", into = "u8")]
#[strum(serialize_all = "snake_case")]
pub enum LineType {
    Override,
    Ring,
    Shout,
    DialTrunk,
}

impl LineType {
    pub fn code(self) -> u8 {
        match self {
            Self::Override => 0,
            Self::Ring => 1,
            Self::Shout => 2,
            Self::DialTrunk => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Override),
            1 => Some(Self::Ring),
            2 => Some(Self::Shout),
            3 => Some(Self::DialTrunk),
            _ => None,
        }
    }

    pub fn is_shout(self) -> bool {
        self == Self::Shout
    }
}

impl From<LineType> for u8 {
    fn from(value: LineType) -> Self {
        value.code()
    }
}

impl TryFrom<u8> for LineType {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("line type must be 0-3, got {code}"))
    }
}

/// Facility documents write the type either as a number or a numeric string.
#[derive(Deserialize)]
#[serde(untagged)]
enum LineTypeRepr {
    Code(u8),
    Text(String),
}

impl TryFrom<LineTypeRepr> for LineType {
    type Error = String;

    fn try_from(repr: LineTypeRepr) -> Result<Self, Self::Error> {
        match repr {
            LineTypeRepr::Code(code) => Self::try_from(code),
            LineTypeRepr::Text(text) => {
                let code: u8 = text
                    .trim()
                    .parse()
                    .map_err(|_| format!("line type must be 0-3, got '{text}'"))?;
                Self::try_from(code)
            }
        }
    }
}

/// One configured line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineDef {
    pub id: String,
    pub line_type: LineType,
    pub label: String,
}

impl LineDef {
    pub fn new(id: impl Into<String>, line_type: LineType, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            line_type,
            label: label.into(),
        }
    }
}

/// One slot of a position's line list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineSlot {
    /// Intentional gap, rendered as an empty slot.
    Placeholder,
    Line(LineDef),
}

impl LineSlot {
    pub fn line(&self) -> Option<&LineDef> {
        match self {
            Self::Placeholder => None,
            Self::Line(def) => Some(def),
        }
    }
}

impl From<LineDef> for LineSlot {
    fn from(def: LineDef) -> Self {
        Self::Line(def)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSlot {
    Line(String, LineType, String),
    Empty([u8; 0]),
}

impl<'de> Deserialize<'de> for LineSlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawSlot::deserialize(deserializer)? {
            RawSlot::Line(id, line_type, label) => Self::Line(LineDef {
                id,
                line_type,
                label,
            }),
            RawSlot::Empty(_) => Self::Placeholder,
        })
    }
}

impl Serialize for LineSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Placeholder => serializer.serialize_seq(Some(0))?.end(),
            Self::Line(def) => (&def.id, def.line_type.code(), &def.label).serialize(serializer),
        }
    }
}
