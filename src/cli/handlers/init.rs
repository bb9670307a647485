use std::fs;
use std::path::Path;

use crate::cli::commands::InitArgs;
use crate::io::config_io::CONFIG_FILE;

const CONFIG_TEMPLATE: &str = r##"# alsdiff configuration
# Every setting is optional; delete a line to get the default back.

[render]
# Show at most this many session clips per track.
# Leave unset to list them all.
# session_clip_limit = 8

# Also list sends that are turned all the way down (-inf).
show_silent_sends = false

[watch]
# Wait this long after the last save before regenerating a summary.
debounce_ms = 500

# Appended to the set's file name: Song.als -> Song.als.txt
suffix = ".txt"
"##;

/// Write the config template into `dir`
pub fn cmd_init(args: InitArgs, dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let path = dir.join(CONFIG_FILE);
    if path.exists() && !args.force {
        return Err(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )
        .into());
    }
    fs::write(&path, CONFIG_TEMPLATE)?;
    println!("Wrote {}", path.display());
    Ok(())
}
