use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "alsdiff", about = concat!("alsdiff v", env!("CARGO_PKG_VERSION"), " - Ableton Live sets as diffable text"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Run against a different project directory
    #[arg(short = 'C', long = "project-dir", global = true)]
    pub project_dir: Option<String>,

    /// Log debug detail to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the text projection of a set to stdout (for git textconv)
    Render(RenderArgs),
    /// Write <set>.als.txt beside each set
    Summarize(SummarizeArgs),
    /// Decode a set and list extraction warnings
    Check(CheckArgs),
    /// Regenerate summaries whenever a set is saved
    Watch(WatchArgs),
    /// Write an alsdiff.toml template in the project directory
    Init(InitArgs),
}

#[derive(Args)]
pub struct RenderArgs {
    /// Path to the .als file
    pub file: String,
}

#[derive(Args)]
pub struct SummarizeArgs {
    /// Sets to summarize
    pub files: Vec<String>,
    /// Summarize every .als in the project directory
    #[arg(long, short = 'a')]
    pub all: bool,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Path to the .als file
    pub file: String,
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct WatchArgs {
    /// Directory to watch (default: the project directory)
    pub dir: Option<String>,
}

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing alsdiff.toml
    #[arg(long)]
    pub force: bool,
}
