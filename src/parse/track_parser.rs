use crate::model::track::{CrossfadeSide, Mixer, Routing, Track, TrackId, TrackKind};
use crate::parse::clip_parser::{extract_arrangement_clips, extract_session_clips};
use crate::parse::context::{self, ExtractContext};
use crate::parse::device_parser::extract_devices;
use crate::parse::tree::Node;
use crate::util::units::{color_name, linear_to_db};

/// References out of a track that can only be resolved once every track has
/// been extracted
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackLinks {
    /// Raw `TrackGroupId`; `None` when the track isn't grouped
    pub group_id: Option<i64>,
    pub sends: Vec<RawSend>,
}

/// One `TrackSendHolder` before it is matched to a return track
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSend {
    /// The holder's `Id`, which indexes the return tracks
    pub holder_id: Option<usize>,
    /// Position of the holder in the list
    pub position: usize,
    /// Level in dB
    pub level: Option<f64>,
}

/// Extract one track from `LiveSet/Tracks`. A track without a name element is
/// dropped with a warning.
pub fn extract_track(
    node: &Node,
    kind: TrackKind,
    path: &str,
    ctx: &mut ExtractContext,
) -> Option<(Track, TrackLinks)> {
    let Some(name) = node.value_at("Name/EffectiveName") else {
        ctx.incomplete(path, "name");
        return None;
    };

    let mut track = Track::new(kind, name);
    track.id = node
        .attr("Id")
        .and_then(|id| id.parse::<i64>().ok())
        .map(TrackId);
    track.color = color(node, path, ctx);
    track.routing = routing(node);
    track.frozen = context::flag(node, "Freeze").unwrap_or(false);
    track.delay_ms = ctx.number(node, "TrackDelay/Value", path);

    let mut links = TrackLinks {
        group_id: ctx
            .integer(node, "TrackGroupId", path)
            .filter(|id| *id >= 0),
        sends: Vec::new(),
    };
    if let Some(mixer) = node.find("DeviceChain/Mixer") {
        track.mixer = extract_mixer(mixer, path, ctx);
        links.sends = raw_sends(mixer, path, ctx);
    }

    if let Some(devices) = devices_node(node) {
        track.devices = extract_devices(devices);
    }
    track.arrangement_clips = extract_arrangement_clips(node, path, ctx);
    track.session_clips = extract_session_clips(node, path, ctx);

    Some((track, links))
}

/// Extract the master track: mixer and devices only, name optional
pub fn extract_master(node: &Node, ctx: &mut ExtractContext) -> Track {
    let path = "Master";
    let name = node.value_at("Name/EffectiveName").unwrap_or("Master");
    let mut track = Track::new(TrackKind::Master, name);
    track.color = color(node, path, ctx);
    if let Some(mixer) = node.find("DeviceChain/Mixer") {
        track.mixer = extract_mixer(mixer, path, ctx);
    }
    if let Some(devices) = devices_node(node) {
        track.devices = extract_devices(devices);
    }
    track
}

fn devices_node(track: &Node) -> Option<&Node> {
    track
        .find("DeviceChain/DeviceChain/Devices")
        .or_else(|| track.find("DeviceChain/Devices"))
}

fn color(node: &Node, path: &str, ctx: &mut ExtractContext) -> Option<String> {
    let field = if node.child("Color").is_some() {
        "Color"
    } else {
        "ColorIndex"
    };
    ctx.integer(node, field, path).map(color_name)
}

fn extract_mixer(mixer: &Node, path: &str, ctx: &mut ExtractContext) -> Mixer {
    let crossfade = match context::manual(mixer, "CrossFadeState") {
        Some("1") => Some(CrossfadeSide::A),
        Some("2") => Some(CrossfadeSide::B),
        _ => None,
    };
    Mixer {
        volume: ctx.manual_number(mixer, "Volume", path).map(linear_to_db),
        pan: ctx.manual_number(mixer, "Pan", path),
        solo: context::flag(mixer, "SoloSink").unwrap_or(false),
        muted: context::manual(mixer, "Speaker") == Some("false"),
        crossfade,
        sends: Default::default(),
    }
}

fn raw_sends(mixer: &Node, path: &str, ctx: &mut ExtractContext) -> Vec<RawSend> {
    let Some(sends) = mixer.child("Sends") else {
        return Vec::new();
    };
    sends
        .children_named("TrackSendHolder")
        .enumerate()
        .map(|(position, holder)| RawSend {
            holder_id: holder.attr("Id").and_then(|id| id.parse().ok()),
            position,
            level: ctx
                .manual_number(holder, "Send", path)
                .map(linear_to_db),
        })
        .collect()
}

fn routing(node: &Node) -> Routing {
    let display = |tag: &str| {
        let target = node.find("DeviceChain")?.child(tag)?;
        let upper = context::text(target, "UpperDisplayString")?;
        Some(match context::text(target, "LowerDisplayString") {
            Some(lower) => format!("{} {}", upper, lower),
            None => upper,
        })
    };
    Routing {
        audio_in: display("AudioInputRouting"),
        audio_out: display("AudioOutputRouting"),
        midi_in: display("MidiInputRouting"),
        midi_out: display("MidiOutputRouting"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::tree::parse_tree;

    const BASS: &str = r#"<AudioTrack Id="12">
  <Name><EffectiveName Value="Bass"/><UserName Value=""/></Name>
  <Color Value="2"/>
  <TrackGroupId Value="7"/>
  <TrackDelay><Value Value="3.5"/><IsValueSampleBased Value="false"/></TrackDelay>
  <Freeze Value="true"/>
  <DeviceChain>
    <AudioInputRouting><UpperDisplayString Value="Ext. In"/><LowerDisplayString Value="1/2"/></AudioInputRouting>
    <AudioOutputRouting><UpperDisplayString Value="Master"/><LowerDisplayString Value=""/></AudioOutputRouting>
    <Mixer>
      <Sends>
        <TrackSendHolder Id="1"><Send><Manual Value="1"/></Send></TrackSendHolder>
        <TrackSendHolder Id="0"><Send><Manual Value="0.0003162277571"/></Send></TrackSendHolder>
      </Sends>
      <Speaker><Manual Value="false"/></Speaker>
      <Volume><Manual Value="0.5"/></Volume>
      <Pan><Manual Value="-0.5"/></Pan>
      <SoloSink Value="true"/>
      <CrossFadeState><Manual Value="2"/></CrossFadeState>
    </Mixer>
    <DeviceChain><Devices><Compressor2/></Devices></DeviceChain>
  </DeviceChain>
</AudioTrack>"#;

    #[test]
    fn test_extract_track_fields() {
        let node = parse_tree(BASS.as_bytes()).unwrap();
        let mut ctx = ExtractContext::new();
        let (track, links) = extract_track(&node, TrackKind::Audio, "Track[0]", &mut ctx).unwrap();
        assert!(ctx.warnings.is_empty());

        assert_eq!(track.id, Some(TrackId(12)));
        assert_eq!(track.name, "Bass");
        assert_eq!(track.color.as_deref(), Some("Red"));
        assert!(track.frozen);
        assert_eq!(track.delay_ms, Some(3.5));
        assert_eq!(track.routing.audio_in.as_deref(), Some("Ext. In 1/2"));
        assert_eq!(track.routing.audio_out.as_deref(), Some("Master"));
        assert_eq!(track.routing.midi_in, None);

        assert!(track.mixer.solo);
        assert!(track.mixer.muted);
        assert_eq!(track.mixer.pan, Some(-0.5));
        assert_eq!(track.mixer.crossfade, Some(CrossfadeSide::B));
        let volume = track.mixer.volume.unwrap();
        assert!((volume - -6.0206).abs() < 0.001);

        assert_eq!(track.devices.len(), 1);
        assert_eq!(links.group_id, Some(7));
        assert_eq!(links.sends.len(), 2);
        assert_eq!(links.sends[0].holder_id, Some(1));
        assert_eq!(links.sends[0].level, Some(0.0));
        assert_eq!(links.sends[1].level, Some(f64::NEG_INFINITY));
    }

    #[test]
    fn test_track_without_name_is_dropped() {
        let node = parse_tree(br#"<MidiTrack Id="3"><Color Value="1"/></MidiTrack>"#).unwrap();
        let mut ctx = ExtractContext::new();
        assert!(extract_track(&node, TrackKind::Midi, "Track[2]", &mut ctx).is_none());
        assert_eq!(ctx.warnings[0].to_string(), "Track[2]: missing name");
    }

    #[test]
    fn test_absent_mixer_fields_stay_absent() {
        let node = parse_tree(
            br#"<MidiTrack Id="3"><Name><EffectiveName Value=""/></Name><TrackGroupId Value="-1"/></MidiTrack>"#,
        )
        .unwrap();
        let mut ctx = ExtractContext::new();
        let (track, links) = extract_track(&node, TrackKind::Midi, "Track[0]", &mut ctx).unwrap();
        assert_eq!(track.name, "");
        assert_eq!(track.mixer.volume, None);
        assert_eq!(track.mixer.pan, None);
        assert_eq!(track.color, None);
        assert_eq!(links.group_id, None);
    }

    #[test]
    fn test_master_uses_plain_device_chain() {
        let node = parse_tree(
            br#"<MasterTrack><DeviceChain><Mixer><Volume><Manual Value="1"/></Volume></Mixer><Devices><Limiter/></Devices></DeviceChain></MasterTrack>"#,
        )
        .unwrap();
        let mut ctx = ExtractContext::new();
        let master = extract_master(&node, &mut ctx);
        assert_eq!(master.kind, TrackKind::Master);
        assert_eq!(master.name, "Master");
        assert_eq!(master.mixer.volume, Some(0.0));
        assert_eq!(master.devices[0].name, "Limiter");
    }
}
