// ── Status classifier ──
//
// Routes every entry of a `channel_status` batch to exactly one
// subsystem bucket, enriches line entries from the call directory, and
// restores the configured panel order.

use serde::Serialize;
use strum::Display;
use vccs_api::ChannelStatusEvent;

use crate::config::OverrideRule;
use crate::directory::CallDirectory;
use crate::state::{GgSlot, LineStatus};

const AIR_GROUND: &str = "A/G";
const SHOUT_PREFIX: &str = "SO_";
const OVERRIDE_PREFIX: &str = "OV_";
const VSCS_PREFIX: &str = "VSCS_";
/// Plain G/G calls carry a prefix of this width.
const DIRECT_PREFIX_LEN: usize = 3;

/// Subsystem a call identifier belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CallKind {
    AirGround,
    Shout,
    Override,
    Vscs,
    GroundGroundDirect,
}

impl CallKind {
    /// Entries of this kind land in the G/G bucket.
    pub fn is_ground_ground(self) -> bool {
        matches!(
            self,
            Self::Shout | Self::Override | Self::GroundGroundDirect
        )
    }
}

/// Classify a call identifier and recover its line id.
///
/// Prefixes are case-sensitive. A/G entries have no line id.
pub fn classify(call: &str) -> (CallKind, &str) {
    if call == AIR_GROUND {
        return (CallKind::AirGround, "");
    }
    if let Some(id) = call.strip_prefix(SHOUT_PREFIX) {
        return (CallKind::Shout, id);
    }
    if let Some(id) = call.strip_prefix(OVERRIDE_PREFIX) {
        return (CallKind::Override, id);
    }
    if let Some(id) = call.strip_prefix(VSCS_PREFIX) {
        return (CallKind::Vscs, id);
    }
    (
        CallKind::GroundGroundDirect,
        call.get(DIRECT_PREFIX_LEN..).unwrap_or_default(),
    )
}

/// One batch split into buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedBatch {
    pub ag: Vec<ChannelStatusEvent>,
    /// Shout, override and direct lines in configured order, with
    /// placeholders at their configured slots.
    pub gg: Vec<GgSlot>,
    pub vscs: Vec<LineStatus>,
    /// Override entries again, for the "being overridden" flag.
    pub overrides: Vec<LineStatus>,
}

impl ClassifiedBatch {
    pub fn overridden(&self, rule: OverrideRule) -> bool {
        self.overrides
            .iter()
            .any(|entry| rule.is_overriding(&entry.status))
    }
}

/// Split one `channel_status` batch.
pub fn classify_batch(batch: Vec<ChannelStatusEvent>, directory: &CallDirectory) -> ClassifiedBatch {
    let mut out = ClassifiedBatch::default();
    let mut gg = Vec::new();

    for event in batch {
        let (kind, line_id) = classify(&event.call);
        match kind {
            CallKind::AirGround => out.ag.push(event),
            CallKind::Vscs => out.vscs.push(enrich(&event, kind, line_id, directory)),
            CallKind::Override => {
                let status = enrich(&event, kind, line_id, directory);
                out.overrides.push(status.clone());
                gg.push(status);
            }
            CallKind::Shout | CallKind::GroundGroundDirect => {
                gg.push(enrich(&event, kind, line_id, directory));
            }
        }
    }

    if directory.has_order() {
        // stable: unknown ids keep arrival order after the known ones
        gg.sort_by_key(|line| directory.order_of(&line.line_id).unwrap_or(usize::MAX));
    }

    out.gg = gg.into_iter().map(GgSlot::Line).collect();
    for &index in directory.placeholders() {
        if index <= out.gg.len() {
            out.gg.insert(index, GgSlot::Placeholder);
        } else {
            out.gg.push(GgSlot::Placeholder);
        }
    }

    tracing::trace!(
        ag = out.ag.len(),
        gg = out.gg.len(),
        vscs = out.vscs.len(),
        overrides = out.overrides.len(),
        "channel status classified"
    );
    out
}

fn enrich(
    event: &ChannelStatusEvent,
    kind: CallKind,
    line_id: &str,
    directory: &CallDirectory,
) -> LineStatus {
    let entry = directory.lookup(line_id);
    LineStatus {
        call: event.call.clone(),
        kind,
        line_id: line_id.to_owned(),
        label: entry.map_or_else(|| line_id.to_owned(), |e| e.label.clone()),
        line_type: entry.map(|e| e.line_type),
        status: event.status.clone(),
        talking: event.talking,
    }
}
