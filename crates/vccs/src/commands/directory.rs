//! Offline call directory build.

use tabled::Tabled;
use vccs_core::{CallDirectory, DirectoryEntry, Position};

use crate::cli::{DirectoryArgs, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "Slot")]
    slot: String,
    #[tabled(rename = "Line")]
    line_id: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Type")]
    line_type: String,
}

impl From<&DirectoryEntry> for EntryRow {
    fn from(e: &DirectoryEntry) -> Self {
        Self {
            slot: e.slot.map_or_else(|| "test".into(), |s| s.to_string()),
            line_id: e.line_id.clone(),
            label: e.label.clone(),
            line_type: e.line_type.to_string(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: DirectoryArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (facility, _) = config::load_facility(global).await?;

    let positions = args
        .positions
        .iter()
        .map(|cs| {
            facility
                .find_position(cs)
                .ok_or_else(|| CliError::PositionNotFound {
                    callsign: cs.clone(),
                })
        })
        .collect::<Result<Vec<&Position>, _>>()?;

    let directory = CallDirectory::build(positions);
    let out = output::render_list(
        global.output,
        directory.entries(),
        |e| EntryRow::from(e),
        |e| e.line_id.clone(),
    )?;
    output::print_output(&out, global.quiet);

    if !global.quiet && !directory.placeholders().is_empty() {
        let slots: Vec<String> = directory
            .placeholders()
            .iter()
            .map(ToString::to_string)
            .collect();
        eprintln!("placeholder slots: {}", slots.join(", "));
    }
    Ok(())
}
