//! Facility position listing.

use serde::Serialize;
use tabled::Tabled;
use vccs_core::{Facility, Position};

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct PositionInfo {
    facility: String,
    callsign: String,
    label: String,
    frequency: Option<u64>,
    lines: usize,
    trunks: Vec<String>,
}

impl PositionInfo {
    fn new(facility: &Facility, position: &Position) -> Self {
        Self {
            facility: facility.id.clone(),
            callsign: position.cs.clone(),
            label: position.label.clone(),
            frequency: position.frequency,
            lines: position.lines.iter().filter_map(|slot| slot.line()).count(),
            trunks: position
                .dial_codes
                .iter()
                .flat_map(|table| table.keys().cloned())
                .collect(),
        }
    }
}

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct PositionRow {
    #[tabled(rename = "Facility")]
    facility: String,
    #[tabled(rename = "Callsign")]
    callsign: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Freq (MHz)")]
    frequency: String,
    #[tabled(rename = "Lines")]
    lines: usize,
    #[tabled(rename = "Trunks")]
    trunks: String,
}

impl From<&PositionInfo> for PositionRow {
    fn from(p: &PositionInfo) -> Self {
        Self {
            facility: p.facility.clone(),
            callsign: p.callsign.clone(),
            label: p.label.clone(),
            frequency: p.frequency.map(format_mhz).unwrap_or_default(),
            lines: p.lines,
            trunks: p.trunks.join(", "),
        }
    }
}

fn format_mhz(hz: u64) -> String {
    format!("{}.{:03}", hz / 1_000_000, (hz / 1_000) % 1_000)
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let (facility, _) = config::load_facility(global).await?;

    let infos: Vec<PositionInfo> = facility
        .all_positions()
        .into_iter()
        .map(|(owner, position)| PositionInfo::new(owner, position))
        .collect();

    let out = output::render_list(global.output, &infos, |p| PositionRow::from(p), |p| {
        p.callsign.clone()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_renders_in_mhz() {
        assert_eq!(format_mhz(127_800_000), "127.800");
        assert_eq!(format_mhz(118_025_000), "118.025");
    }
}
