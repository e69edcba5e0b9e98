use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod render;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    init_tracing(cli.verbose);
    commands::run_command(cli)
}

/// `--verbose` forces debug output; otherwise `RUST_LOG` applies, defaulting
/// to warnings only.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
