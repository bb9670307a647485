use serde::Serialize;

/// What a numeric parameter measures, which decides how it is displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Frequency,
    Percent,
    Seconds,
    Plain,
}

/// The value of one device parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ParamValue {
    Number { value: f64, kind: ValueKind },
    Toggle(bool),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub value: ParamValue,
}

/// One chain inside a rack
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceChain {
    pub name: Option<String>,
    pub devices: Vec<Device>,
}

/// A device in a track's chain. Racks own their chains, which own their devices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Device {
    /// Display name: preset, user name, plugin name, or the device type
    pub name: String,
    /// Element tag of the device (e.g. "AutoFilter", "PluginDevice")
    pub kind: String,
    pub enabled: bool,
    pub parameters: Vec<Parameter>,
    pub chains: Vec<DeviceChain>,
}

impl Device {
    pub fn new(kind: impl Into<String>) -> Self {
        let kind = kind.into();
        Device {
            name: kind.clone(),
            kind,
            enabled: true,
            parameters: Vec::new(),
            chains: Vec::new(),
        }
    }

    /// True for Instrument/Audio Effect/MIDI Effect/Drum racks
    pub fn is_rack(&self) -> bool {
        self.kind.ends_with("GroupDevice")
    }
}
