use serde::{Deserialize, Serialize};

/// Configuration from alsdiff.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub render: RenderOptions,
    #[serde(default)]
    pub watch: WatchConfig,
}

/// Knobs for the text renderer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Show at most this many session clips per track (absent = all)
    #[serde(default)]
    pub session_clip_limit: Option<usize>,
    /// Also list sends that are turned all the way down
    #[serde(default)]
    pub show_silent_sends: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Default: see src/cli/handlers/init.rs
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Appended to the set's file name to name its summary
    #[serde(default = "default_suffix")]
    pub suffix: String,
}

impl Default for WatchConfig {
    fn default() -> Self {
        WatchConfig {
            debounce_ms: default_debounce_ms(),
            suffix: default_suffix(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_suffix() -> String {
    ".txt".to_string()
}
