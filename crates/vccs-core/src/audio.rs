// ── Audio cueing ──
//
// Looping tones driven by G/G status transitions. Playback itself is an
// external concern behind `AudioSink`; the controller only decides when
// a loop starts and stops, and guarantees each loop is started once per
// incoming call and released on teardown.

use std::sync::Arc;

use serde::Serialize;
use strum::Display;
use tokio::sync::mpsc;

use crate::classifier::CallKind;
use crate::state::GgSlot;

/// A looping tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AudioCue {
    /// Incoming call on a line.
    IncomingChime,
    /// Our outgoing call is ringing at the far end.
    Ringback,
}

/// Playback backend.
pub trait AudioSink: Send + Sync {
    fn start(&self, cue: AudioCue);
    fn stop(&self, cue: AudioCue);
}

/// Sink that only logs. Used when no playback device is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl AudioSink for TracingSink {
    fn start(&self, cue: AudioCue) {
        tracing::info!(%cue, "audio cue started");
    }

    fn stop(&self, cue: AudioCue) {
        tracing::info!(%cue, "audio cue stopped");
    }
}

/// Start/stop notification emitted by [`ChannelSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "cue", rename_all = "snake_case")]
pub enum AudioEvent {
    Started(AudioCue),
    Stopped(AudioCue),
}

/// Sink that forwards cue edges to a channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<AudioEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AudioEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl AudioSink for ChannelSink {
    fn start(&self, cue: AudioCue) {
        let _ = self.tx.send(AudioEvent::Started(cue));
    }

    fn stop(&self, cue: AudioCue) {
        let _ = self.tx.send(AudioEvent::Stopped(cue));
    }
}

/// Which tones a batch calls for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AudioDemand {
    pub chime: bool,
    pub ringback: bool,
}

impl AudioDemand {
    /// Derive the wanted tones from a classified G/G bucket.
    ///
    /// Override lines never cue. A `chime` on any other line wants the
    /// incoming chime; `ringing` wants ringback, except on shout lines,
    /// which have no far end to ring.
    pub fn from_gg(slots: &[GgSlot]) -> Self {
        let mut demand = Self::default();
        let lines = slots
            .iter()
            .filter_map(GgSlot::line)
            .filter(|line| line.kind != CallKind::Override);
        for line in lines {
            match line.status.as_str() {
                "chime" => demand.chime = true,
                "ringing" if line.kind != CallKind::Shout => demand.ringback = true,
                _ => {}
            }
        }
        demand
    }
}

/// Tracks which loops are playing and emits only transitions.
pub struct AudioController {
    sink: Arc<dyn AudioSink>,
    playing: AudioDemand,
}

impl AudioController {
    pub fn new(sink: Arc<dyn AudioSink>) -> Self {
        Self {
            sink,
            playing: AudioDemand::default(),
        }
    }

    pub fn apply(&mut self, demand: AudioDemand) {
        self.transition(AudioCue::IncomingChime, self.playing.chime, demand.chime);
        self.transition(AudioCue::Ringback, self.playing.ringback, demand.ringback);
        self.playing = demand;
    }

    /// Release every held loop.
    pub fn stop_all(&mut self) {
        self.apply(AudioDemand::default());
    }

    pub fn playing(&self) -> AudioDemand {
        self.playing
    }

    fn transition(&self, cue: AudioCue, was: bool, wanted: bool) {
        match (was, wanted) {
            (false, true) => self.sink.start(cue),
            (true, false) => self.sink.stop(cue),
            _ => {}
        }
    }
}

impl std::fmt::Debug for AudioController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioController")
            .field("playing", &self.playing)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::state::LineStatus;

    fn slot(call: &str, kind: CallKind, status: &str) -> GgSlot {
        GgSlot::Line(LineStatus {
            call: call.into(),
            kind,
            line_id: call.into(),
            label: call.into(),
            line_type: None,
            status: status.into(),
            talking: None,
        })
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<AudioEvent>) -> Vec<AudioEvent> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    #[test]
    fn demand_rules() {
        let chime_on_shout = [slot("SO_1", CallKind::Shout, "chime")];
        assert!(AudioDemand::from_gg(&chime_on_shout).chime);

        let ringing_on_shout = [slot("SO_1", CallKind::Shout, "ringing")];
        assert_eq!(AudioDemand::from_gg(&ringing_on_shout), AudioDemand::default());

        let on_override = [
            slot("OV_1", CallKind::Override, "chime"),
            slot("OV_2", CallKind::Override, "ringing"),
        ];
        assert_eq!(AudioDemand::from_gg(&on_override), AudioDemand::default());

        let mixed = [
            GgSlot::Placeholder,
            slot("gg_1", CallKind::GroundGroundDirect, "ringing"),
            slot("gg_2", CallKind::GroundGroundDirect, "chime"),
        ];
        assert_eq!(
            AudioDemand::from_gg(&mixed),
            AudioDemand {
                chime: true,
                ringback: true
            }
        );
    }

    #[test]
    fn loops_start_once_and_stop_on_clear() {
        let (sink, mut rx) = ChannelSink::new();
        let mut audio = AudioController::new(Arc::new(sink));
        let chime = AudioDemand {
            chime: true,
            ringback: false,
        };

        audio.apply(chime);
        audio.apply(chime);
        audio.apply(chime);
        assert_eq!(drain(&mut rx), [AudioEvent::Started(AudioCue::IncomingChime)]);

        audio.apply(AudioDemand::default());
        assert_eq!(drain(&mut rx), [AudioEvent::Stopped(AudioCue::IncomingChime)]);
    }

    #[test]
    fn stop_all_releases_held_loops() {
        let (sink, mut rx) = ChannelSink::new();
        let mut audio = AudioController::new(Arc::new(sink));
        audio.apply(AudioDemand {
            chime: true,
            ringback: true,
        });
        drain(&mut rx);

        audio.stop_all();
        assert_eq!(
            drain(&mut rx),
            [
                AudioEvent::Stopped(AudioCue::IncomingChime),
                AudioEvent::Stopped(AudioCue::Ringback),
            ]
        );
        assert_eq!(audio.playing(), AudioDemand::default());

        // nothing left to stop
        audio.stop_all();
        assert!(drain(&mut rx).is_empty());
    }
}
