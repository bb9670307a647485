mod init;
pub use init::cmd_init;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io::load_config;
use crate::io::project_io::{self, SummaryError};
use crate::io::watcher::{AlsWatcher, Debouncer, SetEvent};
use crate::parse::render_with;

/// How long the watch loop blocks on the event channel before checking for
/// debounced paths
const WATCH_TICK: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let dir = project_dir(cli.project_dir.as_deref())?;

    match cli.command {
        Commands::Render(args) => cmd_render(args, &dir),
        Commands::Summarize(args) => cmd_summarize(args, &dir),
        Commands::Check(args) => cmd_check(args, &dir),
        Commands::Watch(args) => cmd_watch(args, &dir),
        Commands::Init(args) => cmd_init(args, &dir),
    }
}

/// The `-C` directory, or the current directory
fn project_dir(flag: Option<&str>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match flag {
        Some(dir) => Ok(std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?),
        None => Ok(std::env::current_dir()?),
    }
}

/// Relative paths are taken from the project directory
fn resolve(dir: &Path, file: &str) -> PathBuf {
    let path = Path::new(file);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        dir.join(path)
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_render(args: RenderArgs, dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(dir)?;
    let project = project_io::load_set(&resolve(dir, &args.file))?;
    print!("{}", render_with(&project, &config.render));
    Ok(())
}

fn cmd_summarize(args: SummarizeArgs, dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(dir)?;

    let sets: Vec<PathBuf> = if args.all {
        project_io::find_als_files(dir)?
    } else if args.files.is_empty() {
        return Err("no sets given (pass files, or --all for every .als here)".into());
    } else {
        args.files.iter().map(|f| resolve(dir, f)).collect()
    };

    if sets.is_empty() {
        println!("No .als files found.");
        return Ok(());
    }

    let report = project_io::summarize_all(&sets, &config);
    for path in &report.written {
        println!("Generated: {}", path.display());
    }
    println!(
        "Generated {}/{} summaries",
        report.written.len(),
        report.total()
    );

    if report.failed.is_empty() {
        Ok(())
    } else {
        Err(format!("{} of {} sets failed", report.failed.len(), report.total()).into())
    }
}

fn cmd_check(args: CheckArgs, dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let path = resolve(dir, &args.file);
    let result = project_io::load_set(&path);

    if args.json {
        let out = match &result {
            Ok(project) => CheckJson {
                file: path.display().to_string(),
                ok: project.warnings.is_empty(),
                error: None,
                warnings: project.warnings.clone(),
            },
            Err(e) => CheckJson {
                file: path.display().to_string(),
                ok: false,
                error: Some(error_json(e)),
                warnings: Vec::new(),
            },
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        result?;
        return Ok(());
    }

    let project = result?;
    if project.warnings.is_empty() {
        println!("{}: no warnings", path.display());
    } else {
        println!("Warnings:");
        for warning in &project.warnings {
            println!("  {}", warning);
        }
    }
    Ok(())
}

fn error_json(err: &SummaryError) -> ErrorJson {
    let kind = match err {
        SummaryError::ReadError { .. } => "read_error",
        SummaryError::DecodeError { source, .. } => source.kind(),
        SummaryError::WriteError { .. } => "write_error",
    };
    ErrorJson {
        kind: kind.to_string(),
        message: err.to_string(),
    }
}

fn cmd_watch(args: WatchArgs, dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let watch_dir = match &args.dir {
        Some(d) => resolve(dir, d),
        None => dir.to_path_buf(),
    };
    let config = load_config(dir)?;
    let watcher = AlsWatcher::start(&watch_dir)?;
    let mut debouncer = Debouncer::new(Duration::from_millis(config.watch.debounce_ms));

    println!("Watching for .als changes in {}", watch_dir.display());
    println!("Press Ctrl+C to stop");

    loop {
        for event in watcher.wait(WATCH_TICK) {
            let SetEvent::Changed(paths) = event;
            let now = Instant::now();
            for path in paths {
                debouncer.touch(path, now);
            }
        }
        for path in debouncer.ready(Instant::now()) {
            tracing::info!(set = %path.display(), "detected change");
            if let Err(e) = project_io::summarize_file(&path, &config) {
                tracing::error!("{}", e);
            }
        }
    }
}
