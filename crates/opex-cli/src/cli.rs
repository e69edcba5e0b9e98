use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "opex", about = "OpEx funds-allocation ledger", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Ledger log file, overriding the configured path
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Name recorded as the caller in logs
    #[arg(long, global = true)]
    pub caller: Option<String>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Reset all four balances to zero
    Init,
    /// Check that balances add up to the issued total
    Verify,
    /// Roll back operations interrupted by a crash
    Recover,
    /// Rewrite the ledger log as a single batch
    Compact,
    /// List the operation catalog
    Operations,
    /// Run any catalog operation with positional arguments
    Call(CallArgs),
}

#[derive(Args)]
pub struct CallArgs {
    /// Operation name, e.g. `issue` or `get_all_project`
    pub operation: String,
    /// Positional arguments, in catalog order
    #[arg(allow_hyphen_values = true)]
    pub args: Vec<String>,
}
