//! Session and state-synchronization engine for voice-console positions.
//!
//! Sits between `vccs-api` (wire protocol and websocket link) and console
//! front ends:
//!
//! - **[`Session`]**: Explicit lifecycle object. [`init()`](Session::init)
//!   starts the reconnect poll and the session task;
//!   [`dispose()`](Session::dispose) cancels timers, the link and any looping
//!   audio. Commands (`select_positions`, `dial`, `send`) and observation
//!   (`subscribe`, `state_stream`, `connection_state`) go through it.
//!
//! - **[`CallDirectory`]**: Immutable, deduplicated line table for the
//!   current selection, swapped atomically on every bootstrap.
//!
//! - **[`classifier`]**: Routes each `channel_status` entry to the A/G,
//!   G/G, VSCS or override bucket via the closed [`CallKind`] enum, and
//!   restores configured panel order.
//!
//! - **[`dial`]**: Two-digit dial code resolution through the facility
//!   tree.
//!
//! - **[`Debouncer`]**: Trailing-edge coalescing of published
//!   [`ConsoleState`] snapshots.

pub mod audio;
pub mod classifier;
pub mod config;
pub mod console;
pub mod dial;
pub mod directory;
pub mod error;
pub mod model;
pub mod publisher;
pub mod session;
pub mod state;

// ── Primary re-exports ──────────────────────────────────────────────
pub use audio::{AudioCue, AudioEvent, AudioSink, ChannelSink, TracingSink};
pub use classifier::{CallKind, classify};
pub use config::{OverrideRule, SessionConfig};
pub use console::{Console, Followup, Outbox};
pub use dial::DialError;
pub use directory::{CallDirectory, DirectoryEntry};
pub use error::CoreError;
pub use model::{DialCodeTable, Facility, FacilitySource, LineDef, LineSlot, LineType, Position};
pub use publisher::Debouncer;
pub use session::Session;
pub use state::{ConsoleState, DialStatus, GgSlot, Identity, LineStatus};

pub use vccs_api::transport::TransportConfig;
pub use vccs_api::{ConnectionState, Outbound, ReconnectConfig};
