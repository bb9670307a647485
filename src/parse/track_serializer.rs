use crate::model::clip::{Clip, ClipContent, FollowAction, SessionClip};
use crate::model::config::RenderOptions;
use crate::model::device::Device;
use crate::model::project::Project;
use crate::model::track::{CrossfadeSide, Track, TrackKind};
use crate::util::units::{
    follow_action_name, format_gain, format_length, format_pan, format_param, format_position,
    format_seconds, launch_mode_name, launch_quantization_name, note_name, single_line,
    warp_mode_name,
};

/// Quote a user-supplied name so it always stays on one line
pub fn quoted(name: &str) -> String {
    let escaped = name
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r");
    format!("\"{}\"", escaped)
}

fn pad(indent: usize) -> String {
    " ".repeat(indent)
}

/// Render a track as its header line followed by its facts.
/// The header sits at `indent`, everything under it two spaces deeper.
pub fn serialize_track(
    track: &Track,
    project: &Project,
    options: &RenderOptions,
    indent: usize,
) -> Vec<String> {
    let mut lines = vec![format!("{}{} {}", pad(indent), track.kind, quoted(&track.name))];
    lines.extend(serialize_track_body(track, project, options, indent + 2));
    lines
}

/// Facts, devices and clips of a track, starting at `indent`
pub fn serialize_track_body(
    track: &Track,
    project: &Project,
    options: &RenderOptions,
    indent: usize,
) -> Vec<String> {
    let p = pad(indent);
    let mut lines = Vec::new();

    if let Some(color) = &track.color {
        lines.push(format!("{}Color: {}", p, color));
    }
    if let Some(group) = track.group {
        let name = project
            .track(group)
            .map(|g| quoted(&g.name))
            .unwrap_or_else(|| group.to_string());
        lines.push(format!("{}Group: {}", p, name));
    }

    let mixer = &track.mixer;
    if let Some(volume) = mixer.volume {
        lines.push(format!("{}Vol: {}", p, format_gain(volume)));
    }
    if let Some(pan) = mixer.pan {
        lines.push(format!("{}Pan: {}", p, format_pan(pan)));
    }
    if mixer.solo {
        lines.push(format!("{}Solo", p));
    }
    if mixer.muted {
        lines.push(format!("{}Muted", p));
    }
    if let Some(side) = mixer.crossfade {
        let side = match side {
            CrossfadeSide::A => "A",
            CrossfadeSide::B => "B",
        };
        lines.push(format!("{}XF: {}", p, side));
    }
    for (name, level) in &mixer.sends {
        if *level == f64::NEG_INFINITY && !options.show_silent_sends {
            continue;
        }
        lines.push(format!(
            "{}Send {}: {}",
            p,
            single_line(name),
            format_gain(*level)
        ));
    }

    let routing = &track.routing;
    let routes = [
        ("Input", &routing.audio_in),
        ("Output", &routing.audio_out),
        ("MIDI In", &routing.midi_in),
        ("MIDI Out", &routing.midi_out),
    ];
    for (label, route) in routes {
        if let Some(route) = route {
            lines.push(format!("{}{}: {}", p, label, single_line(route)));
        }
    }

    if track.frozen {
        lines.push(format!("{}Frozen", p));
    }
    if let Some(delay) = track.delay_ms
        && delay.abs() >= 0.01
    {
        lines.push(format!("{}Delay: {}ms", p, trim_number(delay)));
    }

    if !track.devices.is_empty() {
        lines.push(format!("{}Devices:", p));
        lines.extend(serialize_devices(&track.devices, indent + 2));
    }

    if track.kind == TrackKind::Master {
        return lines;
    }

    if !track.arrangement_clips.is_empty() {
        lines.push(format!("{}Arrangement:", p));
        for arranged in &track.arrangement_clips {
            let clip = &arranged.clip;
            lines.push(format!("{}- {}", pad(indent + 2), clip_heading(clip, project)));
            lines.extend(clip_facts(clip, project, indent + 6));
        }
    }

    if !track.session_clips.is_empty() {
        lines.push(format!("{}Session:", p));
        let shown = options
            .session_clip_limit
            .unwrap_or(usize::MAX)
            .min(track.session_clips.len());
        for session in &track.session_clips[..shown] {
            lines.extend(serialize_session_clip(session, project, indent + 2));
        }
        let hidden = track.session_clips.len() - shown;
        if hidden > 0 {
            lines.push(format!("{}... {} more", pad(indent + 2), hidden));
        }
    }

    lines
}

/// Devices at `indent`, parameters and chains four spaces deeper
pub fn serialize_devices(devices: &[Device], indent: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for device in devices {
        let state = if device.enabled { "" } else { "[OFF] " };
        lines.push(format!(
            "{}- {}{}",
            pad(indent),
            state,
            single_line(&device.name)
        ));
        let inner = pad(indent + 4);
        for param in &device.parameters {
            lines.push(format!(
                "{}{}: {}",
                inner,
                single_line(&param.name),
                format_param(&param.value)
            ));
        }
        for (i, chain) in device.chains.iter().enumerate() {
            match &chain.name {
                Some(name) => lines.push(format!("{}Chain {}:", inner, quoted(name))),
                None => lines.push(format!("{}Chain {}:", inner, i + 1)),
            }
            lines.extend(serialize_devices(&chain.devices, indent + 6));
        }
    }
    lines
}

fn clip_heading(clip: &Clip, project: &Project) -> String {
    format!(
        "{} @ {} - {}",
        quoted(&clip.name),
        format_position(clip.span.start, &project.meter),
        format_position(clip.span.end, &project.meter)
    )
}

fn serialize_session_clip(session: &SessionClip, project: &Project, indent: usize) -> Vec<String> {
    let scene = project
        .scene(session.slot)
        .filter(|s| !s.name.is_empty())
        .map(|s| format!(" ({})", single_line(&s.name)))
        .unwrap_or_default();
    let mut lines = vec![format!(
        "{}- Slot {}{}: {}",
        pad(indent),
        session.slot,
        scene,
        clip_heading(&session.clip, project)
    )];

    let p = pad(indent + 4);
    lines.extend(clip_facts(&session.clip, project, indent + 4));
    if let Some(mode) = session.launch_mode.filter(|m| *m != 0) {
        lines.push(format!("{}Launch: {}", p, launch_mode_name(mode)));
    }
    if let Some(quant) = session.launch_quantization.filter(|q| *q != 0) {
        lines.push(format!("{}Quantization: {}", p, launch_quantization_name(quant)));
    }
    if let Some(follow) = &session.follow_action {
        lines.push(format!("{}Follow: {}", p, follow_text(follow, project)));
    }
    if session.ram {
        lines.push(format!("{}RAM", p));
    }
    lines
}

fn follow_text(follow: &FollowAction, project: &Project) -> String {
    let mut text = format!(
        "{} (chance {})",
        follow_action_name(follow.a.action),
        follow.a.chance
    );
    if let Some(b) = &follow.b {
        text.push_str(&format!(
            " / {} (chance {})",
            follow_action_name(b.action),
            b.chance
        ));
    }
    if let Some(time) = follow.time {
        let sig = project.meter.at(0.0);
        text.push_str(&format!(" after {}", format_length(time, sig)));
    }
    text
}

/// Everything about a clip beyond its name and span, one fact per line.
/// Settings at their neutral value are left out.
fn clip_facts(clip: &Clip, project: &Project, indent: usize) -> Vec<String> {
    let p = pad(indent);
    let sig = project.meter.at(clip.span.start);
    let mut lines = Vec::new();

    if clip.muted {
        lines.push(format!("{}Muted", p));
    }
    if let Some(looping) = &clip.looping
        && looping.enabled
    {
        match (looping.start, looping.end) {
            (Some(start), Some(end)) if end >= start => lines.push(format!(
                "{}Loop: {}",
                p,
                format_length(end - start, sig)
            )),
            _ => lines.push(format!("{}Loop: on", p)),
        }
    }
    if let Some(offset) = clip.offset {
        lines.push(format!("{}Offset: {}", p, format_length(offset, sig)));
    }
    if clip.groove {
        lines.push(format!("{}Groove", p));
    }

    match &clip.content {
        ClipContent::Audio(audio) => {
            if let Some(sample) = &audio.sample {
                lines.push(format!("{}Sample: {}", p, single_line(sample)));
            }
            if let Some(gain) = audio.gain
                && format_gain(gain) != "0dB"
            {
                lines.push(format!("{}Gain: {}", p, format_gain(gain)));
            }
            if let Some(transpose) = audio.transpose.filter(|t| *t != 0) {
                lines.push(format!("{}Transpose: {:+}st", p, transpose));
            }
            if let Some(detune) = audio.detune.filter(|d| d.round() != 0.0) {
                lines.push(format!("{}Detune: {:+}ct", p, detune.round() as i64));
            }
            if let Some(fade) = audio.fade_in.filter(|f| *f > 0.001) {
                lines.push(format!("{}Fade In: {}", p, format_seconds(fade)));
            }
            if let Some(fade) = audio.fade_out.filter(|f| *f > 0.001) {
                lines.push(format!("{}Fade Out: {}", p, format_seconds(fade)));
            }
            if let Some(warp) = &audio.warp {
                let markers = if warp.markers > 2 {
                    format!(" ({} markers)", warp.markers)
                } else {
                    String::new()
                };
                lines.push(format!("{}Warp: {}{}", p, warp_mode_name(warp.mode), markers));
            }
        }
        ClipContent::Midi(midi) => {
            if let Some(notes) = &midi.notes {
                let range = if notes.lowest == notes.highest {
                    note_name(notes.lowest)
                } else {
                    format!("{} - {}", note_name(notes.lowest), note_name(notes.highest))
                };
                lines.push(format!("{}Notes: {} ({})", p, notes.count, range));
            }
        }
    }
    lines
}

/// Up to two decimals, without trailing zeros
fn trim_number(value: f64) -> String {
    let text = format!("{:.2}", value);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}
