use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::device::{Device, DeviceChain, ParamValue, Parameter};
use crate::parse::context;
use crate::parse::tree::Node;
use crate::util::units::{classify_param, device_display_name};

/// Children of a device element that are bookkeeping, not parameters
const SKIP_PARAMS: &[&str] = &[
    "LomId",
    "LomIdView",
    "On",
    "OverwriteProtectionNumber",
    "LastSelectedTimeableIndex",
    "LastSelectedClipEnvelopeIndex",
    "ModulationSourceCount",
    "IsFolded",
    "IsExpanded",
    "ShouldShowPresetName",
    "Annotation",
    "UserName",
    "ParametersListWrapper",
    "LastPresetRef",
    "LockedScripts",
    "SendsListWrapper",
    "Pointee",
    "ViewStateSesstionTrackWidth",
    "SourceContext",
    "BranchSelectorRange",
    "IsAutoSelectEnabled",
    "ChainSelector",
    "Branches",
    "PluginDesc",
    "ParameterList",
];

/// Container elements that can appear among devices but aren't devices
const NOT_DEVICES: &[&str] = &[
    "AudioEffectBranchGroup",
    "MidiEffectBranchGroup",
    "InstrumentBranchGroup",
];

/// Live's placeholder macro names, which carry no information
static DEFAULT_MACRO_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Macro \d+$").expect("valid regex"));

/// Extract the devices listed under a `<Devices>` element, in chain order
pub fn extract_devices(devices: &Node) -> Vec<Device> {
    devices
        .children()
        .filter(|d| !NOT_DEVICES.contains(&d.tag.as_str()))
        .map(extract_device)
        .collect()
}

fn extract_device(node: &Node) -> Device {
    let mut device = Device::new(node.tag.clone());
    if let Some(name) = preset_name(node)
        .or_else(|| context::text(node, "UserName"))
        .or_else(|| plugin_name(node))
        .or_else(|| device_display_name(&node.tag).map(str::to_string))
    {
        device.name = name;
    }
    device.enabled = context::manual(node, "On") != Some("false");

    let macro_names = macro_display_names(node);
    for child in node.children() {
        let tag = child.tag.as_str();
        if SKIP_PARAMS.contains(&tag) || tag.starts_with("MacroDisplayNames.") {
            continue;
        }
        let Some(raw) = child.child("Manual").and_then(Node::value) else {
            continue;
        };
        let name = match tag.strip_prefix("MacroControls.") {
            Some(index) => match index.parse::<usize>().ok().and_then(|i| macro_names.get(&i)) {
                Some(display) => display.clone(),
                // Unnamed macros are skipped
                None => continue,
            },
            None => tag.to_string(),
        };
        let value = param_value(&name, raw);
        device.parameters.push(Parameter { name, value });
    }

    device.parameters.extend(plugin_parameters(node));

    if let Some(branches) = node.child("Branches") {
        for branch in branches.children() {
            let name = context::text(branch, "Name/EffectiveName")
                .or_else(|| context::text(branch, "Name"));
            let devices = branch_devices(branch)
                .map(extract_devices)
                .unwrap_or_default();
            device.chains.push(DeviceChain { name, devices });
        }
    }

    device
}

/// Typed value of a parameter's `Manual`. Anything that is neither a flag
/// nor a number is kept as text.
fn param_value(name: &str, raw: &str) -> ParamValue {
    match raw {
        "true" => ParamValue::Toggle(true),
        "false" => ParamValue::Toggle(false),
        _ => match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => classify_param(name, v),
            _ => ParamValue::Text(raw.to_string()),
        },
    }
}

/// Name of the preset file the device was loaded from, without extension
fn preset_name(device: &Node) -> Option<String> {
    let preset = device.child("LastPresetRef")?;
    preset
        .descendants()
        .filter(|n| n.tag == "RelativePath" || n.tag == "Path")
        .filter_map(Node::value)
        .find(|p| p.ends_with(".adv") || p.ends_with(".adg"))
        .map(|p| {
            let file = p.rsplit(['/', '\\']).next().unwrap_or(p);
            file.rsplit_once('.').map_or(file, |(stem, _)| stem).to_string()
        })
}

fn plugin_name(device: &Node) -> Option<String> {
    let info = device.child("PluginDesc")?.children().next()?;
    context::text(info, "PlugName").or_else(|| context::text(info, "Name"))
}

/// Automated/configured plugin parameters, keyed by the plugin's own names
fn plugin_parameters(device: &Node) -> Vec<Parameter> {
    let Some(list) = device.child("ParameterList") else {
        return Vec::new();
    };
    let mut params = Vec::new();
    for param in list.children() {
        let Some(name) = context::text(param, "ParameterName") else {
            continue;
        };
        let Some(raw) = context::manual(param, "ParameterValue") else {
            continue;
        };
        let value = param_value(&name, raw);
        params.push(Parameter { name, value });
    }
    params
}

/// Custom macro names of a rack, by macro index
fn macro_display_names(device: &Node) -> HashMap<usize, String> {
    device
        .children()
        .filter_map(|child| {
            let index = child.tag.strip_prefix("MacroDisplayNames.")?.parse().ok()?;
            let name = child.value().filter(|n| !n.is_empty())?;
            if DEFAULT_MACRO_NAME.is_match(name) {
                return None;
            }
            Some((index, name.to_string()))
        })
        .collect()
}

/// The `<Devices>` list inside a rack branch
/// (`Branch/DeviceChain/<AudioToAudioDeviceChain|MidiToAudioDeviceChain|..>/Devices`)
fn branch_devices(branch: &Node) -> Option<&Node> {
    branch
        .child("DeviceChain")?
        .children()
        .find_map(|chain| chain.child("Devices"))
}
