// ── Console engine ──
//
// Synchronous heart of a session: owns the facility tree, the selection,
// the operator identity and the working console state. Every inbound
// message and user command runs to completion here before the next one
// is looked at. Timers live in the async shell (`session`); this type
// only reports when one is needed.

use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::Utc;
use vccs_api::{ConnectionManager, Inbound, Outbound};

use crate::audio::{AudioController, AudioDemand};
use crate::classifier;
use crate::config::OverrideRule;
use crate::dial::{self, DialError};
use crate::directory::CallDirectory;
use crate::model::{Facility, Position};
use crate::publisher::Debouncer;
use crate::state::{ConsoleState, DialStatus, Identity};

/// Where outbound messages go. Delivery is best effort.
pub trait Outbox: Send + Sync {
    fn send(&self, message: &Outbound);
}

impl Outbox for ConnectionManager {
    fn send(&self, message: &Outbound) {
        ConnectionManager::send(self, message);
    }
}

/// What the caller must schedule after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Followup {
    Nothing,
    /// A bootstrap registered lines; a `sync` is due after the delay.
    DeferredSync,
}

pub struct Console {
    facilities: Arc<ArcSwap<Facility>>,
    directory: Arc<ArcSwap<CallDirectory>>,
    selection: Vec<String>,
    identity: Option<Identity>,
    state: ConsoleState,
    audio: AudioController,
    publisher: Debouncer<ConsoleState>,
    outbox: Arc<dyn Outbox>,
}

impl Console {
    pub fn new(
        facility: Facility,
        outbox: Arc<dyn Outbox>,
        audio: AudioController,
        publisher: Debouncer<ConsoleState>,
        override_rule: OverrideRule,
    ) -> Self {
        Self {
            facilities: Arc::new(ArcSwap::from_pointee(facility)),
            directory: Arc::new(ArcSwap::from_pointee(CallDirectory::default())),
            selection: Vec::new(),
            identity: None,
            state: ConsoleState {
                override_rule,
                ..ConsoleState::default()
            },
            audio,
            publisher,
            outbox,
        }
    }

    // ── Shared snapshots ─────────────────────────────────────────────

    pub fn facilities_handle(&self) -> Arc<ArcSwap<Facility>> {
        Arc::clone(&self.facilities)
    }

    pub fn directory_handle(&self) -> Arc<ArcSwap<CallDirectory>> {
        Arc::clone(&self.directory)
    }

    pub fn directory(&self) -> Arc<CallDirectory> {
        self.directory.load_full()
    }

    pub fn state(&self) -> &ConsoleState {
        &self.state
    }

    // ── Session bootstrap ────────────────────────────────────────────

    /// Register the current selection with the backend.
    ///
    /// Always clears the previous registration first. Without a known
    /// identity nothing else happens.
    pub fn bootstrap(&mut self) -> Followup {
        self.outbox.send(&Outbound::ClearSession);

        // statuses and loops belong to the registration just discarded
        self.audio.stop_all();
        self.state.ag.clear();
        self.state.gg.clear();
        self.state.vscs.clear();
        self.state.overrides.clear();

        let Some(identity) = self.identity.clone() else {
            tracing::debug!("no identity yet, skipping line registration");
            return Followup::Nothing;
        };

        let facilities = self.facilities.load();
        let positions = self.selected_positions(&facilities);
        let directory = CallDirectory::build(positions);
        for entry in directory.entries() {
            self.outbox.send(&Outbound::AddLine {
                line_id: entry.line_id.clone(),
                line_type: entry.line_type.code(),
            });
        }
        if let Some(id) = identity.id {
            self.outbox.send(&Outbound::AddIdentity { id });
        }

        tracing::debug!(
            callsign = %identity.callsign,
            positions = ?self.selection,
            lines = directory.len(),
            placeholders = directory.placeholders().len(),
            "session bootstrapped"
        );
        self.directory.store(Arc::new(directory));
        Followup::DeferredSync
    }

    fn selected_positions<'a>(&self, facilities: &'a Facility) -> Vec<&'a Position> {
        self.selection
            .iter()
            .filter_map(|cs| {
                let position = facilities.find_position(cs);
                if position.is_none() {
                    tracing::warn!(callsign = %cs, "selected position is not in the facility document");
                }
                position
            })
            .collect()
    }

    /// Replace the selection and re-register.
    pub fn select_positions(&mut self, callsigns: Vec<String>) -> Followup {
        self.selection = callsigns;
        self.state.positions.clone_from(&self.selection);
        let followup = self.bootstrap();
        self.publish();
        followup
    }

    // ── Inbound ──────────────────────────────────────────────────────

    pub fn handle_inbound(&mut self, message: Inbound) -> Followup {
        let mut followup = Followup::Nothing;

        match message {
            Inbound::Version(version) => {
                tracing::info!(%version, "backend version");
                self.state.version = Some(version);
            }
            Inbound::Call { call } => {
                tracing::info!(%call, "incoming call");
                self.state.last_call = Some(call);
            }
            Inbound::ChannelStatus(batch) => self.apply_channel_status(batch),
            Inbound::CallSign { callsign, id } => {
                followup = self.set_identity(Identity { callsign, id });
            }
            Inbound::CallBegin { freq } => {
                self.state.talking.insert(freq);
            }
            Inbound::CallEnd { freq } => {
                self.state.talking.remove(&freq);
            }
            Inbound::Facility(document) => match Facility::from_json(document) {
                Ok(facility) => {
                    tracing::info!(
                        facility = %facility.id,
                        positions = facility.position_count(),
                        "facility document replaced"
                    );
                    self.facilities.store(Arc::new(facility));
                    followup = self.bootstrap();
                }
                Err(e) => tracing::warn!(error = %e, "ignoring facility update"),
            },
            Inbound::DialCallStatus(status) => {
                self.state.dial_status = DialStatus::parse(&status);
            }
            Inbound::TransmitKey(down) => self.state.transmit_key = down,
            Inbound::Other(message) => {
                tracing::trace!(kind = %message.kind, "ignoring message");
                return Followup::Nothing;
            }
        }

        self.publish();
        followup
    }

    fn apply_channel_status(&mut self, batch: Vec<vccs_api::ChannelStatusEvent>) {
        let directory = self.directory.load();
        let classified = classifier::classify_batch(batch, &directory);

        self.audio.apply(AudioDemand::from_gg(&classified.gg));

        self.state.ag = classified.ag;
        self.state.gg = classified.gg;
        self.state.vscs = classified.vscs;
        self.state.overrides = classified.overrides;
    }

    /// Adopt a new identity. An unchanged identity is a no-op.
    ///
    /// With nothing selected yet, the identity's own position (when the
    /// facility document has it) becomes the selection.
    fn set_identity(&mut self, identity: Identity) -> Followup {
        if self.identity.as_ref() == Some(&identity) {
            return Followup::Nothing;
        }
        tracing::info!(callsign = %identity.callsign, id = ?identity.id, "identity announced");

        if self.selection.is_empty() && self.facilities.load().find_position(&identity.callsign).is_some() {
            self.selection = vec![identity.callsign.clone()];
            self.state.positions.clone_from(&self.selection);
        }
        self.state.identity = Some(identity.clone());
        self.identity = Some(identity);
        self.bootstrap()
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn send(&self, message: &Outbound) {
        self.outbox.send(message);
    }

    /// Resolve a dial code for the primary position and place the call.
    pub fn dial(&mut self, trunk: &str, code: &str) -> Result<String, DialError> {
        let result = self.resolve_dial(trunk, code);
        match &result {
            Ok(target) => {
                tracing::debug!(%trunk, %code, %target, "dial code resolved");
                self.outbox.send(&Outbound::DialCall {
                    target: target.clone(),
                    trunk: trunk.to_owned(),
                });
                self.state.dial_status = DialStatus::Dialing;
            }
            Err(e) => {
                tracing::warn!(error = %e, %trunk, %code, "dial code did not resolve");
                self.state.dial_status = DialStatus::Error;
            }
        }
        self.publish();
        result
    }

    fn resolve_dial(&self, trunk: &str, code: &str) -> Result<String, DialError> {
        let primary = self.selection.first().ok_or(DialError::NoSelection)?;
        dial::resolve(&self.facilities.load(), primary, trunk, code)
    }

    // ── Teardown ─────────────────────────────────────────────────────

    /// Release audio loops and drop any unpublished state.
    pub fn shutdown(&mut self) {
        self.audio.stop_all();
        self.publisher.cancel();
    }

    fn publish(&mut self) {
        self.state.updated_at = Some(Utc::now());
        self.publisher.push(self.state.clone());
    }
}
