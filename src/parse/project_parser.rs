use std::collections::HashSet;

use crate::model::project::{
    Key, LoopRegion, Marker, MeterChange, MeterMap, Project, Scene, TimeSignature,
};
use crate::model::track::{Track, TrackId, TrackKind};
use crate::model::warning::Warning;
use crate::parse::context::{self, ExtractContext};
use crate::parse::error::DecodeError;
use crate::parse::track_parser::{RawSend, TrackLinks, extract_master, extract_track};
use crate::parse::tree::Node;

/// Oldest schema generation the extractor understands
const MIN_MAJOR_VERSION: i64 = 4;

/// A track from pass one, with the references still to resolve
struct Extracted {
    track: Track,
    links: TrackLinks,
    path: String,
}

/// Build the semantic project model from the structural tree.
///
/// Only a wrong root element or an unsupported schema generation fail the
/// whole set. Everything else degrades the affected entity and is recorded in
/// `Project::warnings`.
pub fn extract_project(root: &Node) -> Result<Project, DecodeError> {
    if root.tag != "Ableton" {
        return Err(DecodeError::malformed(
            0,
            format!("expected <Ableton> root element, found <{}>", root.tag),
        ));
    }
    if let Some(version) = root
        .attr("MajorVersion")
        .and_then(|v| v.trim().parse::<i64>().ok())
        && version < MIN_MAJOR_VERSION
    {
        return Err(DecodeError::UnsupportedContainer(format!(
            "Live schema version {}",
            version
        )));
    }

    let mut ctx = ExtractContext::new();
    let creator = root.attr("Creator").map(str::to_string);

    let Some(set) = root.child("LiveSet") else {
        ctx.incomplete("LiveSet", "live set");
        return Ok(Project {
            creator,
            tempo: None,
            tempo_automated: false,
            time_signature: None,
            meter: MeterMap::constant(TimeSignature::COMMON),
            key: None,
            loop_region: None,
            tracks: Vec::new(),
            master: None,
            scenes: Vec::new(),
            markers: Vec::new(),
            warnings: ctx.warnings,
        });
    };

    // Pass one: every track with its unresolved references
    let mut extracted = Vec::new();
    let mut return_names: Vec<Option<String>> = Vec::new();
    if let Some(tracks) = set.child("Tracks") {
        let known = tracks.children().filter_map(|n| {
            TrackKind::from_tag(&n.tag)
                .filter(|k| *k != TrackKind::Master)
                .map(|k| (n, k))
        });
        for (i, (node, kind)) in known.enumerate() {
            let path = format!("Track[{}]", i);
            let result = extract_track(node, kind, &path, &mut ctx);
            if kind == TrackKind::Return {
                // A dropped return still occupies its send slot
                return_names.push(result.as_ref().map(|(t, _)| t.name.clone()));
            }
            if let Some((track, links)) = result {
                extracted.push(Extracted { track, links, path });
            }
        }
    }

    // Pass two: sends by holder identity, then group membership
    let bus_names = send_bus_names(&return_names);
    for entry in &mut extracted {
        for send in &entry.links.sends {
            if let Some(level) = send.level {
                entry
                    .track
                    .mixer
                    .sends
                    .insert(send_name(send, &bus_names), level);
            }
        }
    }
    resolve_groups(&mut extracted, &mut ctx);

    let master_node = set.child("MasterTrack").or_else(|| set.child("MainTrack"));
    let master = master_node.map(|m| extract_master(m, &mut ctx));
    let master_mixer = master_node.and_then(|m| m.find("DeviceChain/Mixer"));

    let tempo = master_mixer.and_then(|m| ctx.manual_number(m, "Tempo", "Master"));
    let tempo_automated = master_node
        .zip(master_mixer.and_then(|m| automation_target(m, "Tempo")))
        .is_some_and(|(m, target)| envelope(m, target).is_some());

    let time_signature = master_mixer.and_then(|m| time_signature(m, &mut ctx));
    let meter_changes = master_node
        .zip(master_mixer.and_then(|m| automation_target(m, "TimeSignature")))
        .and_then(|(m, target)| envelope(m, target))
        .map(meter_events)
        .unwrap_or_default();
    let meter = MeterMap::with_changes(
        time_signature.unwrap_or(TimeSignature::COMMON),
        meter_changes,
    );

    Ok(Project {
        creator,
        tempo,
        tempo_automated,
        time_signature,
        meter,
        key: key(set, &mut ctx),
        loop_region: loop_region(set, &mut ctx),
        tracks: extracted.into_iter().map(|e| e.track).collect(),
        master,
        scenes: scenes(set),
        markers: markers(set, &mut ctx),
        warnings: ctx.warnings,
    })
}

/// Display name of each send bus, by return-track index. Duplicate return
/// names get a numeric suffix so every bus maps to a distinct key.
fn send_bus_names(returns: &[Option<String>]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    returns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let base = name.clone().unwrap_or_else(|| fallback_bus_name(i));
            let mut candidate = base.clone();
            let mut n = 2;
            while !seen.insert(candidate.clone()) {
                candidate = format!("{} ({})", base, n);
                n += 1;
            }
            candidate
        })
        .collect()
}

/// `Send A`, `Send B`, .. as Live labels the send knobs
fn fallback_bus_name(index: usize) -> String {
    match u8::try_from(index).ok().filter(|i| *i < 26) {
        Some(i) => format!("Send {}", (b'A' + i) as char),
        None => format!("Send {}", index + 1),
    }
}

fn send_name(send: &RawSend, bus_names: &[String]) -> String {
    let index = send.holder_id.unwrap_or(send.position);
    bus_names
        .get(index)
        .cloned()
        .unwrap_or_else(|| fallback_bus_name(index))
}

/// Link tracks to their group by identity, then break any cycles
fn resolve_groups(tracks: &mut [Extracted], ctx: &mut ExtractContext) {
    let groups: HashSet<TrackId> = tracks
        .iter()
        .filter(|e| e.track.kind == TrackKind::Group)
        .filter_map(|e| e.track.id)
        .collect();

    for entry in tracks.iter_mut() {
        let Some(raw) = entry.links.group_id else {
            continue;
        };
        if groups.contains(&TrackId(raw)) {
            entry.track.group = Some(TrackId(raw));
        } else {
            ctx.warn(Warning::UnresolvedGroup {
                path: entry.path.clone(),
                group_id: raw.to_string(),
            });
        }
    }

    for i in 0..tracks.len() {
        let Some(start) = tracks[i].track.id else {
            continue;
        };
        let mut visited = HashSet::new();
        let mut current = tracks[i].track.group;
        while let Some(id) = current {
            if id == start {
                tracks[i].track.group = None;
                ctx.warn(Warning::GroupCycle {
                    path: tracks[i].path.clone(),
                });
                break;
            }
            if !visited.insert(id) {
                // A cycle further up that doesn't include this track
                break;
            }
            current = tracks
                .iter()
                .find(|e| e.track.id == Some(id))
                .and_then(|e| e.track.group);
        }
    }
}

/// `Id` of the automation target of a mixer parameter
fn automation_target<'a>(mixer: &'a Node, param: &str) -> Option<&'a str> {
    mixer
        .child(param)?
        .child("AutomationTarget")?
        .attr("Id")
        .filter(|id| *id != "0")
}

/// The automation envelope of the master track pointing at `target`
fn envelope<'a>(master: &'a Node, target: &str) -> Option<&'a Node> {
    master
        .find("AutomationEnvelopes/Envelopes")?
        .children_named("AutomationEnvelope")
        .find(|env| env.value_at("EnvelopeTarget/PointeeId") == Some(target))
}

fn time_signature(mixer: &Node, ctx: &mut ExtractContext) -> Option<TimeSignature> {
    let param = mixer.child("TimeSignature")?;
    let manual = param.child("Manual")?;
    let signature = match (manual.child("Numerator"), manual.child("Denominator")) {
        (Some(_), Some(_)) => {
            let numerator = ctx.integer(manual, "Numerator", "Master")?;
            let denominator = ctx.integer(manual, "Denominator", "Master")?;
            TimeSignature::new(
                u32::try_from(numerator).ok()?,
                u32::try_from(denominator).ok()?,
            )
        }
        _ => {
            let raw = ctx.number_attr(manual, "Value", "Master")?;
            TimeSignature::from_live_enum(raw.round() as i64)?
        }
    };
    signature.is_valid().then_some(signature)
}

fn meter_events(envelope: &Node) -> Vec<MeterChange> {
    let Some(events) = envelope.find("Automation/Events") else {
        return Vec::new();
    };
    events
        .children_named("EnumEvent")
        .filter_map(|event| {
            let position = event.attr("Time")?.parse::<f64>().ok()?;
            let value = event.attr("Value")?.parse::<f64>().ok()?;
            let signature = TimeSignature::from_live_enum(value.round() as i64)?;
            Some(MeterChange {
                position,
                signature,
            })
        })
        .collect()
}

fn key(set: &Node, ctx: &mut ExtractContext) -> Option<Key> {
    let scale = set.child("ScaleInformation")?;
    let field = if scale.child("RootNote").is_some() {
        "RootNote"
    } else {
        "Root"
    };
    let root = ctx.integer(scale, field, "ScaleInformation")?;
    let root = u8::try_from(root).ok().filter(|r| *r < 12)?;
    Some(Key {
        root,
        scale: context::text(scale, "Name").unwrap_or_else(|| "Major".to_string()),
    })
}

fn loop_region(set: &Node, ctx: &mut ExtractContext) -> Option<LoopRegion> {
    let transport = set.child("Transport")?;
    let start = ctx.number(transport, "LoopStart", "Transport")?;
    let length = ctx.number(transport, "LoopLength", "Transport")?;
    Some(LoopRegion {
        start,
        end: start + length,
        enabled: context::flag(transport, "LoopOn").unwrap_or(false),
    })
}

fn scenes(set: &Node) -> Vec<Scene> {
    let Some(scenes) = set.child("Scenes") else {
        return Vec::new();
    };
    scenes
        .children_named("Scene")
        .enumerate()
        .map(|(i, scene)| Scene {
            index: i + 1,
            name: scene
                .value_at("Name")
                .unwrap_or_default()
                .to_string(),
        })
        .collect()
}

fn markers(set: &Node, ctx: &mut ExtractContext) -> Vec<Marker> {
    let Some(locators) = set.find("Locators/Locators") else {
        return Vec::new();
    };
    let mut markers = Vec::new();
    for (i, locator) in locators.children_named("Locator").enumerate() {
        let path = format!("Marker[{}]", i);
        let Some(position) = ctx.number(locator, "Time", &path) else {
            ctx.incomplete(&path, "position");
            continue;
        };
        markers.push(Marker {
            position,
            name: locator.value_at("Name").unwrap_or_default().to_string(),
        });
    }
    markers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::tree::parse_tree;

    fn project(xml: &str) -> Project {
        extract_project(&parse_tree(xml.as_bytes()).unwrap()).unwrap()
    }

    fn track(tag: &str, id: i64, name: &str, extra: &str) -> String {
        format!(
            r#"<{tag} Id="{id}"><Name><EffectiveName Value="{name}"/></Name>{extra}</{tag}>"#
        )
    }

    #[test]
    fn test_wrong_root_is_malformed() {
        let root = parse_tree(b"<Project/>").unwrap();
        assert!(matches!(
            extract_project(&root),
            Err(DecodeError::MalformedStructure { .. })
        ));
    }

    #[test]
    fn test_old_schema_is_unsupported() {
        let root = parse_tree(br#"<Ableton MajorVersion="3"><LiveSet/></Ableton>"#).unwrap();
        assert!(matches!(
            extract_project(&root),
            Err(DecodeError::UnsupportedContainer(_))
        ));
    }

    #[test]
    fn test_missing_live_set_degrades() {
        let p = project(r#"<Ableton MajorVersion="5" Creator="Ableton Live 11.3"/>"#);
        assert_eq!(p.creator.as_deref(), Some("Ableton Live 11.3"));
        assert!(p.tracks.is_empty());
        assert_eq!(p.warnings.len(), 1);
    }

    #[test]
    fn test_sends_resolve_by_holder_id() {
        let sends = r#"<DeviceChain><Mixer><Sends>
  <TrackSendHolder Id="1"><Send><Manual Value="1"/></Send></TrackSendHolder>
  <TrackSendHolder Id="0"><Send><Manual Value="0.5"/></Send></TrackSendHolder>
</Sends></Mixer></DeviceChain>"#;
        let xml = format!(
            r#"<Ableton MajorVersion="5"><LiveSet><Tracks>{}{}{}</Tracks></LiveSet></Ableton>"#,
            track("AudioTrack", 1, "Drums", sends),
            track("ReturnTrack", 2, "Reverb", ""),
            track("ReturnTrack", 3, "Delay", ""),
        );
        let p = project(&xml);
        let drums = &p.tracks[0];
        assert_eq!(drums.mixer.sends.get("Delay"), Some(&0.0));
        let reverb = drums.mixer.sends.get("Reverb").copied().unwrap();
        assert!((reverb - -6.0206).abs() < 0.001);
    }

    #[test]
    fn test_duplicate_and_missing_return_names() {
        let names = vec![
            Some("FX".to_string()),
            Some("FX".to_string()),
            None,
        ];
        assert_eq!(send_bus_names(&names), vec!["FX", "FX (2)", "Send C"]);
        assert_eq!(fallback_bus_name(0), "Send A");
        assert_eq!(fallback_bus_name(30), "Send 31");
    }

    #[test]
    fn test_group_membership_by_identity() {
        let xml = format!(
            r#"<Ableton MajorVersion="5"><LiveSet><Tracks>{}{}{}</Tracks></LiveSet></Ableton>"#,
            track("GroupTrack", 10, "Drums", r#"<TrackGroupId Value="-1"/>"#),
            track("AudioTrack", 11, "Kick", r#"<TrackGroupId Value="10"/>"#),
            track("AudioTrack", 12, "Snare", r#"<TrackGroupId Value="99"/>"#),
        );
        let p = project(&xml);
        assert_eq!(p.tracks[1].group, Some(TrackId(10)));
        assert_eq!(p.tracks[2].group, None);
        assert_eq!(
            p.warnings,
            vec![Warning::UnresolvedGroup {
                path: "Track[2]".to_string(),
                group_id: "99".to_string(),
            }]
        );
        assert_eq!(p.track(TrackId(10)).map(|t| t.name.as_str()), Some("Drums"));
    }

    #[test]
    fn test_group_declared_after_member_resolves() {
        let xml = format!(
            r#"<Ableton MajorVersion="5"><LiveSet><Tracks>{}{}</Tracks></LiveSet></Ableton>"#,
            track("AudioTrack", 11, "Kick", r#"<TrackGroupId Value="10"/>"#),
            track("GroupTrack", 10, "Drums", r#"<TrackGroupId Value="-1"/>"#),
        );
        let p = project(&xml);
        assert_eq!(p.tracks[0].group, Some(TrackId(10)));
        assert!(p.warnings.is_empty());
        let out = crate::parse::render(&p);
        assert!(out.contains("  Audio \"Kick\"\n    Group: \"Drums\"\n"));
    }

    #[test]
    fn test_group_cycle_is_broken() {
        let xml = format!(
            r#"<Ableton MajorVersion="5"><LiveSet><Tracks>{}{}</Tracks></LiveSet></Ableton>"#,
            track("GroupTrack", 1, "A", r#"<TrackGroupId Value="2"/>"#),
            track("GroupTrack", 2, "B", r#"<TrackGroupId Value="1"/>"#),
        );
        let p = project(&xml);
        assert_eq!(p.tracks[0].group, None);
        assert_eq!(p.tracks[1].group, Some(TrackId(1)));
        assert_eq!(
            p.warnings,
            vec![Warning::GroupCycle {
                path: "Track[0]".to_string()
            }]
        );
    }

    #[test]
    fn test_transport_key_scenes_and_markers() {
        let p = project(
            r#"<Ableton MajorVersion="5"><LiveSet>
  <Transport><LoopOn Value="true"/><LoopStart Value="0"/><LoopLength Value="32"/></Transport>
  <ScaleInformation><RootNote Value="3"/><Name Value="Minor"/></ScaleInformation>
  <Scenes><Scene Id="0"><Name Value="Intro"/></Scene><Scene Id="1"><Name Value=""/></Scene></Scenes>
  <Locators><Locators>
    <Locator Id="0"><Time Value="16"/><Name Value="Drop"/></Locator>
    <Locator Id="1"><Name Value="Lost"/></Locator>
  </Locators></Locators>
</LiveSet></Ableton>"#,
        );
        assert_eq!(
            p.loop_region,
            Some(LoopRegion {
                start: 0.0,
                end: 32.0,
                enabled: true
            })
        );
        assert_eq!(
            p.key,
            Some(Key {
                root: 3,
                scale: "Minor".to_string()
            })
        );
        assert_eq!(p.scenes.len(), 2);
        assert_eq!(p.scene(2).map(|s| s.name.as_str()), Some(""));
        assert_eq!(p.markers.len(), 1);
        assert_eq!(p.markers[0].name, "Drop");
        assert_eq!(p.warnings[0].to_string(), "Marker[1]: missing position");
    }

    #[test]
    fn test_tempo_and_time_signature_automation() {
        let p = project(
            r#"<Ableton MajorVersion="5"><LiveSet><MasterTrack>
  <AutomationEnvelopes><Envelopes>
    <AutomationEnvelope Id="0">
      <EnvelopeTarget><PointeeId Value="8"/></EnvelopeTarget>
      <Automation><Events>
        <EnumEvent Id="1" Time="-63072000" Value="201"/>
        <EnumEvent Id="2" Time="16" Value="302"/>
      </Events></Automation>
    </AutomationEnvelope>
    <AutomationEnvelope Id="1">
      <EnvelopeTarget><PointeeId Value="9"/></EnvelopeTarget>
      <Automation><Events><FloatEvent Time="0" Value="120"/></Events></Automation>
    </AutomationEnvelope>
  </Envelopes></AutomationEnvelopes>
  <DeviceChain><Mixer>
    <Tempo><Manual Value="128.5"/><AutomationTarget Id="9"/></Tempo>
    <TimeSignature><Manual Value="201"/><AutomationTarget Id="8"/></TimeSignature>
  </Mixer></DeviceChain>
</MasterTrack></LiveSet></Ableton>"#,
        );
        assert_eq!(p.tempo, Some(128.5));
        assert!(p.tempo_automated);
        assert_eq!(p.time_signature, Some(TimeSignature::COMMON));
        assert_eq!(p.meter.at(0.0), TimeSignature::COMMON);
        assert_eq!(p.meter.at(16.0), TimeSignature::new(6, 8));
        assert!(p.master.is_some());
    }

    #[test]
    fn test_absent_tempo_stays_absent() {
        let p = project(r#"<Ableton MajorVersion="5"><LiveSet/></Ableton>"#);
        assert_eq!(p.tempo, None);
        assert!(!p.tempo_automated);
        assert_eq!(p.time_signature, None);
        assert_eq!(p.meter.at(100.0), TimeSignature::COMMON);
        assert!(p.warnings.is_empty());
    }

    #[test]
    fn test_numerator_denominator_time_signature() {
        let p = project(
            r#"<Ableton MajorVersion="5"><LiveSet><MasterTrack><DeviceChain><Mixer>
  <TimeSignature><Manual><Numerator Value="7"/><Denominator Value="8"/></Manual></TimeSignature>
</Mixer></DeviceChain></MasterTrack></LiveSet></Ableton>"#,
        );
        assert_eq!(p.time_signature, Some(TimeSignature::new(7, 8)));
    }
}
