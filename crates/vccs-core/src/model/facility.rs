// ── Facility document ──
//
// Nested facility → position tree loaded once at startup. It is the
// source for the call directory and for dial-code resolution, and is
// replaced wholesale when the backend pushes a `facility` message.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;
use vccs_api::transport::TransportConfig;

use super::line::LineSlot;
use crate::error::CoreError;

/// `trunk name → (dial code → target identifier)`.
pub type DialCodeTable = BTreeMap<String, BTreeMap<String, String>>;

/// An operator position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Callsign, unique across the document.
    pub cs: String,

    #[serde(default)]
    pub label: String,

    /// Primary frequency in Hz.
    #[serde(default, alias = "freq", skip_serializing_if = "Option::is_none")]
    pub frequency: Option<u64>,

    #[serde(default)]
    pub lines: Vec<LineSlot>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dial_codes: Option<DialCodeTable>,
}

impl Position {
    pub fn new(cs: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            cs: cs.into(),
            label: label.into(),
            frequency: None,
            lines: Vec::new(),
            dial_codes: None,
        }
    }

    pub fn with_lines(mut self, lines: impl IntoIterator<Item = LineSlot>) -> Self {
        self.lines = lines.into_iter().collect();
        self
    }
}

/// A facility level. The document root is itself a facility.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facility {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub positions: Vec<Position>,

    #[serde(default, alias = "childFacilities")]
    pub children: Vec<Facility>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dial_codes: Option<DialCodeTable>,
}

impl Facility {
    pub fn from_json(value: serde_json::Value) -> Result<Self, CoreError> {
        serde_json::from_value(value).map_err(|e| CoreError::Facility {
            message: e.to_string(),
        })
    }

    /// Find a position by callsign: this level's positions first, then
    /// each child facility recursively.
    pub fn find_position(&self, cs: &str) -> Option<&Position> {
        self.owner_chain(cs).map(|(_, position)| position)
    }

    /// Facility chain (root first) leading to the facility that owns `cs`.
    pub fn owner_chain(&self, cs: &str) -> Option<(Vec<&Facility>, &Position)> {
        if let Some(position) = self.positions.iter().find(|p| p.cs == cs) {
            return Some((vec![self], position));
        }
        self.children.iter().find_map(|child| {
            child.owner_chain(cs).map(|(mut chain, position)| {
                chain.insert(0, self);
                (chain, position)
            })
        })
    }

    /// Every position in the tree, depth-first, with its owning facility.
    pub fn all_positions(&self) -> Vec<(&Facility, &Position)> {
        let mut out: Vec<(&Facility, &Position)> =
            self.positions.iter().map(|p| (self, p)).collect();
        for child in &self.children {
            out.extend(child.all_positions());
        }
        out
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
            + self
                .children
                .iter()
                .map(Facility::position_count)
                .sum::<usize>()
    }
}

// ── Facility source ─────────────────────────────────────────────────

/// Where the startup facility document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacilitySource {
    File(PathBuf),
    Url(Url),
}

impl FacilitySource {
    /// `http(s)://` locations are fetched; anything else is a local path.
    pub fn parse(location: &str) -> Self {
        match Url::parse(location) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Self::Url(url),
            _ => Self::File(PathBuf::from(location)),
        }
    }

    pub async fn load(&self, transport: &TransportConfig) -> Result<Facility, CoreError> {
        let value = match self {
            Self::File(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| CoreError::Facility {
                    message: format!("cannot read {}: {e}", path.display()),
                })?;
                serde_json::from_str(&text).map_err(|e| CoreError::Facility {
                    message: format!("{}: {e}", path.display()),
                })?
            }
            Self::Url(url) => transport.fetch_json(url).await?,
        };

        let facility = Facility::from_json(value)?;
        tracing::debug!(
            source = %self,
            facility = %facility.id,
            positions = facility.position_count(),
            "facility document loaded"
        );
        Ok(facility)
    }
}

impl fmt::Display for FacilitySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{url}"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Facility {
        Facility::from_json(json!({
            "id": "ZOA",
            "name": "Oakland Center",
            "positions": [
                { "cs": "OAK_40_CTR", "label": "Sector 40", "freq": 127_800_000,
                  "lines": [["100", "1", "Tower"], [], ["200", "2", "Shout A"]] }
            ],
            "children": [
                {
                    "id": "NCT",
                    "name": "NorCal TRACON",
                    "dial_codes": { "APCH": { "11": "OAK_40_CTR", "12": "SFO_U_APP" } },
                    "positions": [ { "cs": "SFO_U_APP", "label": "Woodside", "lines": [] } ],
                    "children": [
                        { "id": "SFO", "positions": [ { "cs": "SFO_TWR", "label": "Tower" } ] }
                    ]
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn finds_positions_at_every_depth() {
        let root = sample();
        assert_eq!(root.find_position("OAK_40_CTR").unwrap().frequency, Some(127_800_000));
        assert_eq!(root.find_position("SFO_TWR").unwrap().label, "Tower");
        assert!(root.find_position("LAX_TWR").is_none());
        assert_eq!(root.position_count(), 3);
    }

    #[test]
    fn owner_chain_runs_root_first() {
        let root = sample();
        let (chain, position) = root.owner_chain("SFO_TWR").unwrap();
        let ids: Vec<&str> = chain.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, ["ZOA", "NCT", "SFO"]);
        assert_eq!(position.cs, "SFO_TWR");
    }

    #[test]
    fn all_positions_is_depth_first() {
        let root = sample();
        let cs: Vec<&str> = root.all_positions().iter().map(|(_, p)| p.cs.as_str()).collect();
        assert_eq!(cs, ["OAK_40_CTR", "SFO_U_APP", "SFO_TWR"]);
    }

    #[test]
    fn source_parsing() {
        assert!(matches!(
            FacilitySource::parse("https://example.com/zoa.json"),
            FacilitySource::Url(_)
        ));
        assert_eq!(
            FacilitySource::parse("./facilities/zoa.json"),
            FacilitySource::File(PathBuf::from("./facilities/zoa.json"))
        );
    }

    #[tokio::test]
    async fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zoa.json");
        std::fs::write(&path, serde_json::to_string(&sample()).unwrap()).unwrap();

        let loaded = FacilitySource::File(path)
            .load(&TransportConfig::default())
            .await
            .unwrap();
        assert_eq!(loaded, sample());
    }

    #[tokio::test]
    async fn missing_file_is_a_facility_error() {
        let err = FacilitySource::File(PathBuf::from("/nonexistent/zoa.json"))
            .load(&TransportConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Facility { .. }));
    }

    #[tokio::test]
    async fn loads_from_url() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample()))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/zoa.json", server.uri())).unwrap();
        let loaded = FacilitySource::Url(url)
            .load(&TransportConfig::default())
            .await
            .unwrap();
        assert_eq!(loaded.id, "ZOA");
    }
}
