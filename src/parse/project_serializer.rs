use crate::model::config::RenderOptions;
use crate::model::project::{Marker, Project};
use crate::parse::track_serializer::{serialize_track, serialize_track_body};
use crate::util::units::{format_length, format_position, format_tempo, key_name, single_line};

/// Render a project with the default options.
pub fn render(project: &Project) -> String {
    render_with(project, &RenderOptions::default())
}

/// Render a project as line-oriented text.
///
/// The output is a pure function of the project and options: sections appear
/// in a fixed order, source-ordered sequences keep their order, and every
/// leaf fact sits on its own line so that one change in the set shows up as
/// one changed line in a diff.
pub fn render_with(project: &Project, options: &RenderOptions) -> String {
    let mut sections = vec![header(project)];

    let markers = markers(project);
    if !markers.is_empty() {
        sections.push(markers);
    }

    let mut tracks = vec![format!("TRACKS ({})", project.tracks.len())];
    for track in &project.tracks {
        tracks.extend(serialize_track(track, project, options, 2));
    }
    sections.push(tracks);

    if let Some(master) = &project.master {
        let mut lines = vec!["MASTER".to_string()];
        lines.extend(serialize_track_body(master, project, options, 2));
        sections.push(lines);
    }

    if !project.scenes.is_empty() {
        let mut lines = vec!["SCENES".to_string()];
        for scene in &project.scenes {
            lines.push(format!("  [{}] {}", scene.index, single_line(&scene.name)));
        }
        sections.push(lines);
    }

    let mut out = String::new();
    for (i, section) in sections.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        for line in section {
            out.push_str(line.trim_end());
            out.push('\n');
        }
    }
    out
}

fn header(project: &Project) -> Vec<String> {
    let mut lines = vec!["ABLETON PROJECT".to_string()];
    if let Some(creator) = &project.creator {
        lines.push(format!("Creator: {}", single_line(creator)));
    }
    if let Some(tempo) = project.tempo {
        let automated = if project.tempo_automated {
            " [automated]"
        } else {
            ""
        };
        lines.push(format!("Tempo: {} BPM{}", format_tempo(tempo), automated));
    }
    // Positions are computed from the meter map, so its opening signature is
    // the one shown, even when an envelope event overrides the mixer value
    if project.time_signature.is_some() || project.meter.changes().len() > 1 {
        lines.push(format!("Time Signature: {}", project.meter.at(0.0)));
    }
    for change in project.meter.changes().iter().skip(1) {
        lines.push(format!(
            "Time Signature: {} @ {}",
            change.signature,
            format_position(change.position, &project.meter)
        ));
    }
    if let Some(key) = &project.key {
        lines.push(format!("Key: {}", key_name(key)));
    }
    if let Some(region) = &project.loop_region {
        let state = if region.enabled { "" } else { " [off]" };
        lines.push(format!(
            "Loop: {} - {} ({}){}",
            format_position(region.start, &project.meter),
            format_position(region.end, &project.meter),
            format_length(region.end - region.start, project.meter.at(region.start)),
            state
        ));
    }
    lines
}

/// Markers sorted by position, then label
fn markers(project: &Project) -> Vec<String> {
    if project.markers.is_empty() {
        return Vec::new();
    }
    let mut sorted: Vec<&Marker> = project.markers.iter().collect();
    sorted.sort_by(|a, b| {
        a.position
            .total_cmp(&b.position)
            .then_with(|| a.name.cmp(&b.name))
    });

    let mut lines = vec!["MARKERS".to_string()];
    for marker in sorted {
        lines.push(format!(
            "  {} {}",
            format_position(marker.position, &project.meter),
            single_line(&marker.name)
        ));
    }
    lines
}
