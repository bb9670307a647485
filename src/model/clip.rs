use serde::Serialize;

/// Start and end of a clip in beats (quarter notes)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Span {
    pub start: f64,
    pub end: f64,
}

/// Clip loop brace
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClipLoop {
    pub enabled: bool,
    pub start: Option<f64>,
    pub end: Option<f64>,
}

/// Warping state of an audio clip
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warp {
    pub mode: i64,
    pub markers: usize,
}

/// Audio-only clip fields
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AudioDetails {
    /// File name of the referenced sample, when the reference survives
    pub sample: Option<String>,
    pub fade_in: Option<f64>,
    pub fade_out: Option<f64>,
    pub warp: Option<Warp>,
    /// Clip gain in dB
    pub gain: Option<f64>,
    /// Transpose in semitones
    pub transpose: Option<i64>,
    /// Detune in cents
    pub detune: Option<f64>,
}

/// Summary of the notes in a MIDI clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NoteSummary {
    pub count: usize,
    pub lowest: u8,
    pub highest: u8,
}

/// MIDI-only clip fields
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MidiDetails {
    pub notes: Option<NoteSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClipContent {
    Audio(AudioDetails),
    Midi(MidiDetails),
}

/// Fields shared by arrangement and session clips
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Clip {
    pub name: String,
    pub span: Span,
    pub muted: bool,
    pub looping: Option<ClipLoop>,
    /// Playback start offset inside the clip, in beats
    pub offset: Option<f64>,
    pub groove: bool,
    pub content: ClipContent,
}

/// A clip placed on the arrangement timeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrangementClip {
    #[serde(flatten)]
    pub clip: Clip,
}

/// One of a session clip's two follow actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FollowChoice {
    pub action: i64,
    /// Relative chance, as entered in Live
    pub chance: i64,
}

/// What happens after a session clip has played for `time` beats
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FollowAction {
    pub time: Option<f64>,
    pub a: FollowChoice,
    pub b: Option<FollowChoice>,
}

/// A clip sitting in a session-view slot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionClip {
    /// 1-indexed slot, matching `Scene::index`
    pub slot: usize,
    #[serde(flatten)]
    pub clip: Clip,
    pub launch_mode: Option<i64>,
    pub launch_quantization: Option<i64>,
    pub follow_action: Option<FollowAction>,
    pub ram: bool,
}
