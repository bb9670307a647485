use alsdiff::cli::commands::Cli;
use alsdiff::cli::handlers;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

/// Logs go to stderr so `render` output stays clean for git textconv.
/// `RUST_LOG` overrides the level.
fn init_logging(verbose: bool) {
    let default = if verbose { "alsdiff=debug" } else { "alsdiff=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
