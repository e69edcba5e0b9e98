use anyhow::Context;
use colored::Colorize;
use opex_ledger::{Command as LedgerCommand, Ledger, LedgerConfig, LedgerError, Response};
use opex_store::LogKvStore;
use opex_types::{AnonymousCaller, CallerIdentity, FixedCaller};
use tracing::debug;

use crate::cli::*;
use crate::render;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let caller: Box<dyn CallerIdentity> = match &cli.caller {
        Some(name) => Box::new(FixedCaller::new(name.as_str())),
        None => Box::new(AnonymousCaller),
    };
    let format = cli.format;

    match cli.command {
        Command::Operations => {
            render::operations(format)?;
            Ok(())
        }
        Command::Init => execute(&open_ledger(config)?, LedgerCommand::Init, &*caller, format),
        Command::Verify => execute(&open_ledger(config)?, LedgerCommand::Verify, &*caller, format),
        Command::Recover => cmd_recover(config, format),
        Command::Compact => cmd_compact(config, format),
        Command::Call(args) => {
            let command = match LedgerCommand::parse(&args.operation, &args.args) {
                Ok(command) => command,
                Err(e) => return fail(e, format),
            };
            execute(&open_ledger(config)?, command, &*caller, format)
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<LedgerConfig> {
    let mut config = match &cli.config {
        Some(path) => LedgerConfig::load(path)?,
        None => LedgerConfig::default(),
    };
    if let Some(path) = &cli.store {
        config.store.path = path.clone();
    }
    debug!(store = %config.store.path.display(), "configuration loaded");
    Ok(config)
}

fn open_store(config: &LedgerConfig) -> anyhow::Result<LogKvStore> {
    let path = &config.store.path;
    LogKvStore::open(path, config.store.sync)
        .with_context(|| format!("cannot open ledger log {}", path.display()))
}

fn open_ledger(config: LedgerConfig) -> anyhow::Result<Ledger<LogKvStore>> {
    let store = open_store(&config)?;
    Ok(Ledger::open(store, config)?)
}

fn execute(
    ledger: &Ledger<LogKvStore>,
    command: LedgerCommand,
    caller: &dyn CallerIdentity,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match ledger.execute(command, caller) {
        Ok(response) => {
            render::response(&response, format)?;
            check_balanced(&response)
        }
        Err(e) => fail(e, format),
    }
}

/// `verify` reports through its output, but an unbalanced ledger still
/// exits non-zero.
fn check_balanced(response: &Response) -> anyhow::Result<()> {
    if let Response::Conservation(report) = response {
        if !report.balanced {
            anyhow::bail!("ledger is not balanced");
        }
    }
    Ok(())
}

fn fail(error: LedgerError, format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        render::error_json(&error)?;
    }
    Err(error.into())
}

fn cmd_recover(config: LedgerConfig, format: OutputFormat) -> anyhow::Result<()> {
    let ledger = Ledger::new(open_store(&config)?, config);
    let pending = ledger.pending_intents()?;
    let repaired = ledger.recover()?;
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "rolled_back": pending }));
        }
        OutputFormat::Text if repaired == 0 => {
            println!("{} Nothing to recover.", "✓".green().bold());
        }
        OutputFormat::Text => {
            println!("{} Rolled back {} interrupted operation(s)", "✓".green().bold(), repaired);
            for intent in &pending {
                println!("  {}", intent.yellow());
            }
        }
    }
    Ok(())
}

fn cmd_compact(config: LedgerConfig, format: OutputFormat) -> anyhow::Result<()> {
    let ledger = open_ledger(config)?;
    let store = ledger.store();
    store.compact()?;
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "entries": store.len() }));
        }
        OutputFormat::Text => {
            println!(
                "{} Compacted {} ({} entries)",
                "✓".green().bold(),
                store.path().display().to_string().bold(),
                store.len()
            );
        }
    }
    Ok(())
}
