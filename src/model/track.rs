use std::collections::BTreeMap;

use serde::Serialize;

use super::clip::{ArrangementClip, SessionClip};
use super::device::Device;

/// Identity of a track, taken from its `Id` attribute in the set
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TrackId(pub i64);

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind of track, from its element tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Midi,
    Return,
    Group,
    Master,
}

impl TrackKind {
    pub fn from_tag(tag: &str) -> Option<TrackKind> {
        match tag {
            "AudioTrack" => Some(TrackKind::Audio),
            "MidiTrack" => Some(TrackKind::Midi),
            "ReturnTrack" => Some(TrackKind::Return),
            "GroupTrack" => Some(TrackKind::Group),
            "MasterTrack" => Some(TrackKind::Master),
            _ => None,
        }
    }
}

impl std::fmt::Display for TrackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackKind::Audio => write!(f, "Audio"),
            TrackKind::Midi => write!(f, "MIDI"),
            TrackKind::Return => write!(f, "Return"),
            TrackKind::Group => write!(f, "Group"),
            TrackKind::Master => write!(f, "Master"),
        }
    }
}

/// Crossfader assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CrossfadeSide {
    A,
    B,
}

/// Mixer strip state. Levels are in dB; silence is negative infinity.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Mixer {
    pub volume: Option<f64>,
    /// -1.0 (hard left) to 1.0 (hard right)
    pub pan: Option<f64>,
    pub solo: bool,
    pub muted: bool,
    pub crossfade: Option<CrossfadeSide>,
    /// Send level per return track name
    pub sends: BTreeMap<String, f64>,
}

/// Input and output routing as shown in Live's I/O section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Routing {
    pub audio_in: Option<String>,
    pub audio_out: Option<String>,
    pub midi_in: Option<String>,
    pub midi_out: Option<String>,
}

/// A track with its mixer, devices and clips
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Track {
    pub id: Option<TrackId>,
    pub kind: TrackKind,
    pub name: String,
    /// Display color name (e.g. "Red")
    pub color: Option<String>,
    pub mixer: Mixer,
    pub routing: Routing,
    pub frozen: bool,
    pub delay_ms: Option<f64>,
    /// The containing group track. Non-owning; look it up with `Project::track`.
    pub group: Option<TrackId>,
    pub devices: Vec<Device>,
    pub arrangement_clips: Vec<ArrangementClip>,
    pub session_clips: Vec<SessionClip>,
}

impl Track {
    /// Create an empty track of the given kind
    pub fn new(kind: TrackKind, name: impl Into<String>) -> Self {
        Track {
            id: None,
            kind,
            name: name.into(),
            color: None,
            mixer: Mixer::default(),
            routing: Routing::default(),
            frozen: false,
            delay_ms: None,
            group: None,
            devices: Vec::new(),
            arrangement_clips: Vec::new(),
            session_clips: Vec::new(),
        }
    }
}
