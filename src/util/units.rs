//! Unit-aware display formatting for values pulled out of a Live set.
//!
//! Every function here is total: a value that can't be shown sensibly comes
//! back as [`SENTINEL`] instead of an error, so one broken number never stops
//! the rest of a summary from rendering. The precision of each format is the
//! one place that decides which changes are worth a diff line.

use crate::model::device::{ParamValue, ValueKind};
use crate::model::project::{Key, MeterMap, TICKS_PER_QUARTER, TimeSignature};

/// Shown in place of a value that can't be formatted
pub const SENTINEL: &str = "—";

/// Live's lowest fader position (-70 dB), displayed as -inf
const SILENCE_FLOOR: f64 = 0.000_316_227_8;

/// Pan values closer to zero than this read as center
const PAN_DEAD_ZONE: f64 = 0.01;

/// Positions beyond this many beats are treated as garbage
const MAX_BEATS: f64 = 1.0e9;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

const NOTE_NAMES_FLAT: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

// ---------------------------------------------------------------------------
// Levels
// ---------------------------------------------------------------------------

/// Convert Live's linear fader amplitude (1.0 = 0 dB) to dB.
/// Anything at or below the fader floor is negative infinity.
pub fn linear_to_db(linear: f64) -> f64 {
    if linear.is_nan() {
        return f64::NAN;
    }
    if linear <= SILENCE_FLOOR {
        return f64::NEG_INFINITY;
    }
    20.0 * linear.log10()
}

/// One decimal place, explicit sign, `0dB` for zero, `-inf` for silence
pub fn format_gain(db: f64) -> String {
    if db == f64::NEG_INFINITY {
        return "-inf".to_string();
    }
    if !db.is_finite() {
        return SENTINEL.to_string();
    }
    let rounded = (db * 10.0).round() / 10.0;
    if rounded == 0.0 {
        "0dB".to_string()
    } else {
        format!("{:+.1}dB", rounded)
    }
}

/// `C` inside the dead zone, otherwise `L`/`R` with an integer percentage
pub fn format_pan(pan: f64) -> String {
    if !pan.is_finite() || pan.abs() > 1.0 + 1e-6 {
        return SENTINEL.to_string();
    }
    if pan.abs() < PAN_DEAD_ZONE {
        return "C".to_string();
    }
    let pct = (pan.abs() * 100.0).round() as i64;
    if pan < 0.0 {
        format!("L{}", pct)
    } else {
        format!("R{}", pct)
    }
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Integer Hz below 1 kHz, one-decimal kHz from there up
pub fn format_frequency(hz: f64) -> String {
    if !hz.is_finite() || hz < 0.0 {
        return SENTINEL.to_string();
    }
    let rounded = hz.round();
    if rounded < 1000.0 {
        format!("{}Hz", rounded as i64)
    } else {
        format!("{:.1}kHz", hz / 1000.0)
    }
}

/// Milliseconds under a second, two-decimal seconds above
pub fn format_seconds(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return SENTINEL.to_string();
    }
    if seconds < 1.0 {
        format!("{:.0}ms", seconds * 1000.0)
    } else {
        format!("{:.2}s", seconds)
    }
}

/// A 0..1 fraction as a whole percentage
pub fn format_percent(fraction: f64) -> String {
    if !fraction.is_finite() {
        return SENTINEL.to_string();
    }
    format!("{:.0}%", fraction * 100.0)
}

/// Integers as-is, everything else to two decimals
pub fn format_plain(value: f64) -> String {
    if !value.is_finite() {
        return SENTINEL.to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

/// Tempo without trailing zeros (`120`, `128.5`, `93.33`)
pub fn format_tempo(bpm: f64) -> String {
    if !bpm.is_finite() || bpm <= 0.0 {
        return SENTINEL.to_string();
    }
    let text = format!("{:.2}", bpm);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

pub fn format_toggle(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}

pub fn format_value(value: f64, kind: ValueKind) -> String {
    match kind {
        ValueKind::Frequency => format_frequency(value),
        ValueKind::Percent => format_percent(value),
        ValueKind::Seconds => format_seconds(value),
        ValueKind::Plain => format_plain(value),
    }
}

/// Escape line breaks in free text taken from the set, so a name can never
/// spill onto a second line of the projection
pub fn single_line(text: &str) -> String {
    text.replace('\r', "\\r").replace('\n', "\\n")
}

pub fn format_param(value: &ParamValue) -> String {
    match value {
        ParamValue::Number { value, kind } => format_value(*value, *kind),
        ParamValue::Toggle(on) => format_toggle(*on).to_string(),
        ParamValue::Text(text) => single_line(text),
    }
}

/// Split a parameter name like `FilterFreq` or `Dry/Wet` into lowercase words
fn name_words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in name.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Decide how a numeric parameter should be shown from its name and value
pub fn classify_param(name: &str, value: f64) -> ParamValue {
    let words = name_words(name);
    let lower = name.to_lowercase();
    let has = |candidates: &[&str]| words.iter().any(|w| candidates.contains(&w.as_str()));

    let timing = lower.contains("time") || lower.contains("rate");
    if (value == 0.0 || value == 1.0)
        && !timing
        && has(&["on", "sync", "link", "freeze", "enabled"])
    {
        return ParamValue::Toggle(value == 1.0);
    }

    let kind = if (0.0..=1.0).contains(&value)
        && has(&[
            "wet", "dry", "mix", "amount", "feedback", "depth", "gain", "drive", "resonance",
        ]) {
        ValueKind::Percent
    } else if (has(&["freq", "frequency", "cutoff", "hz"]) || lower.contains("freq"))
        && !has(&["mod"])
    {
        ValueKind::Frequency
    } else if (has(&["attack", "decay", "release"])
        || lower.contains("predelay")
        || lower.contains("timesec"))
        && value < 10.0
    {
        ValueKind::Seconds
    } else {
        ValueKind::Plain
    };
    ParamValue::Number { value, kind }
}

// ---------------------------------------------------------------------------
// Musical time
// ---------------------------------------------------------------------------

fn to_ticks(beats: f64) -> i64 {
    (beats * TICKS_PER_QUARTER as f64).round() as i64
}

/// `bar.beat.sixteenth`, 1-indexed, using the meter in force at each point
/// of the timeline. `beats` counts quarter notes from the start of the set.
pub fn format_position(beats: f64, meter: &MeterMap) -> String {
    if !beats.is_finite() || !(0.0..=MAX_BEATS).contains(&beats) {
        return SENTINEL.to_string();
    }
    let ticks = to_ticks(beats);
    let changes = meter.changes();
    let mut bars_before = 0;

    for (i, change) in changes.iter().enumerate() {
        let sig = change.signature;
        if !sig.is_valid() {
            return SENTINEL.to_string();
        }
        let segment_start = to_ticks(change.position);
        let segment_end = changes.get(i + 1).map(|next| to_ticks(next.position));
        let bar_ticks = sig.bar_ticks();

        if let Some(end) = segment_end
            && ticks >= end
        {
            // A change in the middle of a bar still starts a fresh bar
            bars_before += (end - segment_start + bar_ticks - 1) / bar_ticks;
            continue;
        }

        let rel = ticks - segment_start;
        let bar = bars_before + rel / bar_ticks + 1;
        let in_bar = rel % bar_ticks;
        let beat = in_bar / sig.beat_ticks() + 1;
        let sixteenth = (in_bar % sig.beat_ticks()) / (TICKS_PER_QUARTER / 4) + 1;
        return format!("{}.{}.{}", bar, beat, sixteenth);
    }
    SENTINEL.to_string()
}

fn plural(n: i64, word: &str) -> String {
    if n == 1 {
        format!("1 {}", word)
    } else {
        format!("{} {}s", n, word)
    }
}

/// A duration in beats as bars, beats and sixteenths of the given meter
pub fn format_length(beats: f64, sig: TimeSignature) -> String {
    if !beats.is_finite() || !(0.0..=MAX_BEATS).contains(&beats) || !sig.is_valid() {
        return SENTINEL.to_string();
    }
    let ticks = to_ticks(beats);
    let bars = ticks / sig.bar_ticks();
    let rest = ticks % sig.bar_ticks();
    let whole_beats = rest / sig.beat_ticks();
    let sixteenths = (rest % sig.beat_ticks()) / (TICKS_PER_QUARTER / 4);

    let mut parts = Vec::new();
    if bars > 0 {
        parts.push(plural(bars, "bar"));
    }
    if whole_beats > 0 {
        parts.push(plural(whole_beats, "beat"));
    }
    if sixteenths > 0 {
        parts.push(plural(sixteenths, "sixteenth"));
    }
    if parts.is_empty() {
        return "0 beats".to_string();
    }
    parts.join(" ")
}

// ---------------------------------------------------------------------------
// Names
// ---------------------------------------------------------------------------

/// MIDI pitch in Live's convention, where 60 is C3
pub fn note_name(pitch: u8) -> String {
    let octave = pitch as i32 / 12 - 2;
    format!("{}{}", NOTE_NAMES[pitch as usize % 12], octave)
}

pub fn key_name(key: &Key) -> String {
    format!(
        "{} {}",
        NOTE_NAMES_FLAT[key.root as usize % 12],
        single_line(&key.scale)
    )
}

pub fn color_name(index: i64) -> String {
    let name = match index {
        0 => "Gray",
        1 => "Rose",
        2 => "Red",
        3 => "Orange",
        4 => "Gold",
        5 => "Yellow",
        6 => "Lime",
        7 => "Green",
        8 => "Teal",
        9 => "Cyan",
        10 => "Sky",
        11 => "Blue",
        12 => "Indigo",
        13 => "Purple",
        14 => "Violet",
        15 => "Pink",
        16 => "Hot Pink",
        17 => "Flesh",
        18 => "Tan",
        19 => "Peach",
        20 => "Khaki",
        21 => "Light Green",
        22 => "Sea Foam",
        23 => "Light Blue",
        24 => "Lavender",
        25 => "Light Purple",
        26 => "White",
        69 => "Default",
        other => return format!("Color {}", other),
    };
    name.to_string()
}

/// Display name of a stock Live device, from its element tag
pub fn device_display_name(tag: &str) -> Option<&'static str> {
    let name = match tag {
        "AutoFilter" => "Auto Filter",
        "AutoPan" => "Auto Pan",
        "BeatRepeat" => "Beat Repeat",
        "Chorus2" => "Chorus-Ensemble",
        "Compressor2" => "Compressor",
        "Delay" => "Delay",
        "DrumBuss" => "Drum Buss",
        "Echo" => "Echo",
        "Eq8" => "EQ Eight",
        "FilterEQ3" => "EQ Three",
        "FilterDelay" => "Filter Delay",
        "FrequencyShifter" => "Frequency Shifter",
        "Gate" => "Gate",
        "GlueCompressor" => "Glue Compressor",
        "GrainDelay" => "Grain Delay",
        "Hybrid" => "Hybrid Reverb",
        "Limiter" => "Limiter",
        "MultibandDynamics" => "Multiband Dynamics",
        "Overdrive" => "Overdrive",
        "PingPongDelay" => "Ping Pong Delay",
        "Redux2" => "Redux",
        "Reverb" => "Reverb",
        "Saturator" => "Saturator",
        "StereoGain" => "Utility",
        "Tuner" => "Tuner",
        "Vocoder" => "Vocoder",
        "InstrumentVector" => "Wavetable",
        "Operator" => "Operator",
        "OriginalSimpler" => "Simpler",
        "MultiSampler" => "Sampler",
        "UltraAnalog" => "Analog",
        "Drift" => "Drift",
        "InstrumentImpulse" => "Impulse",
        "LoungeLizard" => "Electric",
        "StringStudio" => "Tension",
        "Collision" => "Collision",
        "MidiArpeggiator" => "Arpeggiator",
        "MidiChord" => "Chord",
        "MidiNoteLength" => "Note Length",
        "MidiPitcher" => "Pitch",
        "MidiRandom" => "Random",
        "MidiScale" => "Scale",
        "MidiVelocity" => "Velocity",
        "AudioEffectGroupDevice" => "Audio Effect Rack",
        "InstrumentGroupDevice" => "Instrument Rack",
        "MidiEffectGroupDevice" => "MIDI Effect Rack",
        "DrumGroupDevice" => "Drum Rack",
        _ => return None,
    };
    Some(name)
}

pub fn warp_mode_name(mode: i64) -> String {
    match mode {
        0 => "Beats".to_string(),
        1 => "Tones".to_string(),
        2 => "Texture".to_string(),
        3 => "Re-Pitch".to_string(),
        4 => "Complex".to_string(),
        6 => "Complex Pro".to_string(),
        other => format!("mode {}", other),
    }
}

pub fn launch_mode_name(mode: i64) -> String {
    match mode {
        0 => "trigger".to_string(),
        1 => "gate".to_string(),
        2 => "toggle".to_string(),
        3 => "repeat".to_string(),
        other => format!("mode {}", other),
    }
}

pub fn launch_quantization_name(quant: i64) -> String {
    let name = match quant {
        0 => "global",
        1 => "8 bars",
        2 => "4 bars",
        3 => "2 bars",
        4 => "1 bar",
        5 => "1/2",
        6 => "1/2T",
        7 => "1/4",
        8 => "1/4T",
        9 => "1/8",
        10 => "1/8T",
        11 => "1/16",
        12 => "1/16T",
        13 => "1/32",
        14 => "none",
        other => return format!("quantization {}", other),
    };
    name.to_string()
}

pub fn follow_action_name(action: i64) -> String {
    let name = match action {
        0 => "none",
        1 => "stop",
        2 => "again",
        3 => "prev",
        4 => "next",
        5 => "first",
        6 => "last",
        7 => "any",
        8 => "other",
        9 => "jump",
        other => return format!("action {}", other),
    };
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::project::MeterChange;

    fn common() -> MeterMap {
        MeterMap::constant(TimeSignature::COMMON)
    }

    #[test]
    fn test_frequency_boundaries() {
        assert_eq!(format_frequency(500.0), "500Hz");
        assert_eq!(format_frequency(999.0), "999Hz");
        assert_eq!(format_frequency(999.7), "1.0kHz");
        assert_eq!(format_frequency(1000.0), "1.0kHz");
        assert_eq!(format_frequency(2500.0), "2.5kHz");
        assert_eq!(format_frequency(18_500.0), "18.5kHz");
        assert_eq!(format_frequency(f64::NAN), SENTINEL);
        assert_eq!(format_frequency(-3.0), SENTINEL);
    }

    #[test]
    fn test_gain_formatting() {
        assert_eq!(format_gain(0.0), "0dB");
        assert_eq!(format_gain(0.04), "0dB");
        assert_eq!(format_gain(-0.04), "0dB");
        assert_eq!(format_gain(2.0), "+2.0dB");
        assert_eq!(format_gain(-6.02), "-6.0dB");
        assert_eq!(format_gain(f64::NEG_INFINITY), "-inf");
        assert_eq!(format_gain(f64::NAN), SENTINEL);
        assert_eq!(format_gain(f64::INFINITY), SENTINEL);
    }

    #[test]
    fn test_linear_to_db() {
        assert_eq!(linear_to_db(1.0), 0.0);
        assert_eq!(format_gain(linear_to_db(0.5)), "-6.0dB");
        assert_eq!(linear_to_db(0.0003162277571), f64::NEG_INFINITY);
        assert_eq!(linear_to_db(0.0), f64::NEG_INFINITY);
        assert!(linear_to_db(f64::NAN).is_nan());
    }

    #[test]
    fn test_pan_buckets() {
        assert_eq!(format_pan(0.0), "C");
        assert_eq!(format_pan(0.004), "C");
        assert_eq!(format_pan(-0.009), "C");
        assert_eq!(format_pan(0.5), "R50");
        assert_eq!(format_pan(-0.25), "L25");
        assert_eq!(format_pan(-1.0), "L100");
        assert_eq!(format_pan(1.5), SENTINEL);
        assert_eq!(format_pan(f64::NAN), SENTINEL);
    }

    #[test]
    fn test_seconds_percent_plain() {
        assert_eq!(format_seconds(0.01), "10ms");
        assert_eq!(format_seconds(1.5), "1.50s");
        assert_eq!(format_percent(0.3), "30%");
        assert_eq!(format_plain(3.0), "3");
        assert_eq!(format_plain(0.126), "0.13");
        assert_eq!(format_plain(f64::INFINITY), SENTINEL);
        assert_eq!(format_tempo(120.0), "120");
        assert_eq!(format_tempo(128.5), "128.5");
        assert_eq!(format_tempo(0.0), SENTINEL);
    }

    #[test]
    fn test_position_in_common_time() {
        let meter = common();
        assert_eq!(format_position(0.0, &meter), "1.1.1");
        assert_eq!(format_position(0.25, &meter), "1.1.2");
        assert_eq!(format_position(1.0, &meter), "1.2.1");
        assert_eq!(format_position(4.0, &meter), "2.1.1");
        assert_eq!(format_position(128.0, &meter), "33.1.1");
        // float noise from the file must not leak into the output
        assert_eq!(format_position(3.9999999, &meter), "2.1.1");
        assert_eq!(format_position(-1.0, &meter), SENTINEL);
        assert_eq!(format_position(f64::NAN, &meter), SENTINEL);
    }

    #[test]
    fn test_position_in_compound_time() {
        let meter = MeterMap::constant(TimeSignature::new(6, 8));
        assert_eq!(format_position(1.5, &meter), "1.4.1");
        assert_eq!(format_position(3.0, &meter), "2.1.1");
        assert_eq!(format_position(0.25, &meter), "1.1.2");
    }

    #[test]
    fn test_position_across_meter_change() {
        let meter = MeterMap::with_changes(
            TimeSignature::COMMON,
            vec![MeterChange {
                position: 16.0,
                signature: TimeSignature::new(3, 4),
            }],
        );
        assert_eq!(format_position(15.0, &meter), "4.4.1");
        assert_eq!(format_position(16.0, &meter), "5.1.1");
        assert_eq!(format_position(19.0, &meter), "6.1.1");
    }

    #[test]
    fn test_length() {
        assert_eq!(format_length(32.0, TimeSignature::COMMON), "8 bars");
        assert_eq!(format_length(4.0, TimeSignature::COMMON), "1 bar");
        assert_eq!(format_length(6.0, TimeSignature::COMMON), "1 bar 2 beats");
        assert_eq!(format_length(0.25, TimeSignature::COMMON), "1 sixteenth");
        assert_eq!(format_length(0.0, TimeSignature::COMMON), "0 beats");
    }

    #[test]
    fn test_classify_param() {
        assert_eq!(
            classify_param("Cutoff", 500.0),
            ParamValue::Number {
                value: 500.0,
                kind: ValueKind::Frequency
            }
        );
        assert_eq!(
            classify_param("DryWet", 0.3),
            ParamValue::Number {
                value: 0.3,
                kind: ValueKind::Percent
            }
        );
        assert_eq!(
            classify_param("Resonance", 1.0),
            ParamValue::Number {
                value: 1.0,
                kind: ValueKind::Percent
            }
        );
        assert_eq!(classify_param("SyncOn", 1.0), ParamValue::Toggle(true));
        assert_eq!(
            classify_param("Attack", 0.02),
            ParamValue::Number {
                value: 0.02,
                kind: ValueKind::Seconds
            }
        );
        assert_eq!(
            classify_param("FreqModAmount", 4.0),
            ParamValue::Number {
                value: 4.0,
                kind: ValueKind::Plain
            }
        );
        assert_eq!(
            classify_param("SyncedRate", 1.0),
            ParamValue::Number {
                value: 1.0,
                kind: ValueKind::Plain
            }
        );
    }

    #[test]
    fn test_name_words() {
        assert_eq!(name_words("FilterFreq"), vec!["filter", "freq"]);
        assert_eq!(name_words("Dry/Wet"), vec!["dry", "wet"]);
        assert_eq!(name_words("Band1Freq"), vec!["band1", "freq"]);
    }

    #[test]
    fn test_names() {
        assert_eq!(note_name(60), "C3");
        assert_eq!(note_name(36), "C1");
        assert_eq!(note_name(67), "G3");
        assert_eq!(
            key_name(&Key {
                root: 3,
                scale: "Minor".to_string()
            }),
            "Eb Minor"
        );
        assert_eq!(color_name(2), "Red");
        assert_eq!(color_name(42), "Color 42");
        assert_eq!(launch_mode_name(1), "gate");
        assert_eq!(follow_action_name(4), "next");
        assert_eq!(warp_mode_name(6), "Complex Pro");
        assert_eq!(device_display_name("AutoFilter"), Some("Auto Filter"));
        assert_eq!(device_display_name("Eq8"), Some("EQ Eight"));
        assert_eq!(device_display_name("SomeFutureDevice"), None);
    }

    #[test]
    fn test_single_line_escapes_breaks() {
        assert_eq!(single_line("Intro"), "Intro");
        assert_eq!(single_line("Intro\n  9.1.1 Fake"), "Intro\\n  9.1.1 Fake");
        assert_eq!(single_line("a\r\nb"), "a\\r\\nb");
        assert_eq!(
            format_param(&ParamValue::Text("two\nlines".to_string())),
            "two\\nlines"
        );
    }
}
