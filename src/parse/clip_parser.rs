use crate::model::clip::{
    ArrangementClip, AudioDetails, Clip, ClipContent, ClipLoop, FollowAction, FollowChoice,
    MidiDetails, NoteSummary, SessionClip, Span, Warp,
};
use crate::parse::context::{self, ExtractContext};
use crate::parse::tree::Node;
use crate::util::units::linear_to_db;

/// Clip element tags, in the order Live writes them
const CLIP_TAGS: &[&str] = &["AudioClip", "MidiClip"];

/// Arrangement clips of a track, in source order. Clips without a time span
/// are dropped with a warning.
pub fn extract_arrangement_clips(
    track: &Node,
    path: &str,
    ctx: &mut ExtractContext,
) -> Vec<ArrangementClip> {
    let Some(sequencer) = track.find("DeviceChain/MainSequencer") else {
        return Vec::new();
    };
    // Audio and MIDI tracks nest the timeline one level differently
    let events = sequencer
        .find("Sample/ArrangerAutomation/Events")
        .or_else(|| sequencer.find("ClipTimeable/ArrangerAutomation/Events"));
    let Some(events) = events else {
        return Vec::new();
    };

    events
        .children()
        .filter(|n| CLIP_TAGS.contains(&n.tag.as_str()))
        .enumerate()
        .filter_map(|(i, node)| {
            let clip_path = format!("{}/ArrangementClip[{}]", path, i);
            extract_clip(node, &clip_path, ctx).map(|clip| ArrangementClip { clip })
        })
        .collect()
}

/// Session clips of a track with their 1-indexed slot. Empty slots are skipped.
pub fn extract_session_clips(
    track: &Node,
    path: &str,
    ctx: &mut ExtractContext,
) -> Vec<SessionClip> {
    let Some(slots) = track.find("DeviceChain/MainSequencer/ClipSlotList") else {
        return Vec::new();
    };

    let mut clips = Vec::new();
    for (i, slot) in slots.children_named("ClipSlot").enumerate() {
        let Some(node) = slot
            .find("ClipSlot/Value")
            .and_then(|v| v.children().find(|n| CLIP_TAGS.contains(&n.tag.as_str())))
        else {
            continue;
        };
        let clip_path = format!("{}/SessionClip[{}]", path, i);
        let Some(clip) = extract_clip(node, &clip_path, ctx) else {
            continue;
        };
        clips.push(SessionClip {
            slot: i + 1,
            clip,
            launch_mode: ctx.integer(node, "LaunchMode", &clip_path),
            launch_quantization: ctx.integer(node, "LaunchQuantisation", &clip_path),
            follow_action: follow_action(node, &clip_path, ctx),
            ram: context::flag(node, "Ram").unwrap_or(false),
        });
    }
    clips
}

fn extract_clip(node: &Node, path: &str, ctx: &mut ExtractContext) -> Option<Clip> {
    let start = match node.attr("Time") {
        Some(_) => ctx.number_attr(node, "Time", path),
        None => ctx.number(node, "CurrentStart", path),
    };
    let end = ctx.number(node, "CurrentEnd", path);
    let (Some(start), Some(end)) = (start, end) else {
        ctx.incomplete(path, "time span");
        return None;
    };

    let looping = node.child("Loop").map(|l| ClipLoop {
        enabled: context::flag(l, "LoopOn").unwrap_or(false),
        start: ctx.number(l, "LoopStart", path),
        end: ctx.number(l, "LoopEnd", path),
    });

    let relative = node
        .child("Loop")
        .and_then(|l| ctx.number(l, "StartRelative", path));
    let offset = looping
        .map(|l| l.start.unwrap_or(0.0) + relative.unwrap_or(0.0))
        .filter(|o| *o != 0.0);

    let groove = ctx
        .integer(node, "GrooveSettings/GrooveId", path)
        .is_some_and(|id| id >= 0);

    let content = if node.tag == "AudioClip" {
        ClipContent::Audio(audio_details(node, path, ctx))
    } else {
        ClipContent::Midi(MidiDetails {
            notes: note_summary(node),
        })
    };

    Some(Clip {
        name: node.value_at("Name").unwrap_or_default().to_string(),
        span: Span { start, end },
        muted: context::flag(node, "Disabled").unwrap_or(false),
        looping,
        offset,
        groove,
        content,
    })
}

fn audio_details(node: &Node, path: &str, ctx: &mut ExtractContext) -> AudioDetails {
    let sample = node.find("SampleRef/FileRef").and_then(|file| {
        ["RelativePath", "Path"]
            .iter()
            .filter_map(|field| context::text(file, field))
            .map(|p| p.rsplit(['/', '\\']).next().unwrap_or_default().to_string())
            .find(|name| !name.is_empty())
            .or_else(|| context::text(file, "Name"))
    });

    let warp = match context::flag(node, "IsWarped") {
        Some(true) => Some(Warp {
            mode: ctx.integer(node, "WarpMode", path).unwrap_or(0),
            markers: node
                .child("WarpMarkers")
                .map_or(0, |m| m.children_named("WarpMarker").count()),
        }),
        _ => None,
    };

    AudioDetails {
        sample,
        fade_in: ctx.number(node, "Fades/FadeInLength", path),
        fade_out: ctx.number(node, "Fades/FadeOutLength", path),
        warp,
        gain: ctx.number(node, "SampleVolume", path).map(linear_to_db),
        transpose: ctx.integer(node, "PitchCoarse", path),
        detune: ctx.number(node, "PitchFine", path),
    }
}

/// Note count and pitch range over all key tracks that hold notes
fn note_summary(node: &Node) -> Option<NoteSummary> {
    let key_tracks = node.find("Notes/KeyTracks")?;
    let mut summary: Option<NoteSummary> = None;
    for key_track in key_tracks.children_named("KeyTrack") {
        let Some(pitch) = key_track
            .value_at("MidiKey")
            .and_then(|v| v.parse::<u8>().ok())
        else {
            continue;
        };
        let count = key_track
            .child("Notes")
            .map_or(0, |n| n.children_named("MidiNoteEvent").count());
        if count == 0 {
            continue;
        }
        summary = Some(match summary {
            Some(s) => NoteSummary {
                count: s.count + count,
                lowest: s.lowest.min(pitch),
                highest: s.highest.max(pitch),
            },
            None => NoteSummary {
                count,
                lowest: pitch,
                highest: pitch,
            },
        });
    }
    summary
}

fn follow_action(node: &Node, path: &str, ctx: &mut ExtractContext) -> Option<FollowAction> {
    let follow = node.child("FollowAction")?;
    if context::flag(follow, "FollowActionEnabled") != Some(true) {
        return None;
    }
    let a = FollowChoice {
        action: ctx.integer(follow, "FollowActionA", path).unwrap_or(0),
        chance: ctx.integer(follow, "FollowChanceA", path).unwrap_or(100),
    };
    let b = ctx
        .integer(follow, "FollowActionB", path)
        .map(|action| FollowChoice {
            action,
            chance: ctx.integer(follow, "FollowChanceB", path).unwrap_or(0),
        })
        .filter(|b| b.action != 0 && b.chance > 0);
    Some(FollowAction {
        time: ctx.number(follow, "FollowTime", path),
        a,
        b,
    })
}
