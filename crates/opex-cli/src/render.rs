use colored::Colorize;
use opex_ledger::{ConservationReport, LedgerError, Response, OPERATIONS};
use opex_types::{Amount, ConfirmationState, Project};
use serde::Serialize;
use serde_json::Value;

use crate::cli::OutputFormat;

pub fn response(response: &Response, format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(response)?);
        return Ok(());
    }
    match response {
        Response::Balances(rows) => balances(rows),
        Response::Amount(amount) => balances(std::slice::from_ref(amount)),
        Response::Issue(issue) => record(issue)?,
        Response::Project(project) => project_record(project)?,
        Response::Distribution(distribution) => record(distribution)?,
        Response::Receivable(receivable) => record(receivable)?,
        Response::Confirmed(outcome) => {
            println!(
                "{} {} confirmed {}: {} moved from FG",
                "✓".green().bold(),
                outcome.entity.to_string().bold(),
                outcome.project_id.to_string().yellow(),
                outcome.amount
            );
            println!("  FG balance: {}", outcome.fg_balance);
            println!("  {} balance: {}", outcome.entity, outcome.entity_balance);
            println!("  State: {}", state(outcome.state));
        }
        Response::Issues(items) => list(items)?,
        Response::Projects(items) => {
            if items.is_empty() {
                println!("No records.");
            }
            for (i, project) in items.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                project_record(project)?;
            }
        }
        Response::Distributions(items) => list(items)?,
        Response::Receivables(items) => list(items)?,
        Response::Conservation(report) => conservation(report),
    }
    Ok(())
}

/// Machine-readable error body, printed to stdout.
pub fn error_json(error: &LedgerError) -> anyhow::Result<()> {
    let body = serde_json::json!({
        "error": error.kind().as_str(),
        "message": error.to_string(),
    });
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

pub fn operations(format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        let catalog: Vec<Value> = OPERATIONS
            .iter()
            .map(|op| {
                serde_json::json!({
                    "name": op.name,
                    "fields": op.fields,
                    "mutates": op.mutates,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }
    for op in OPERATIONS {
        let name = if op.mutates {
            op.name.yellow().bold()
        } else {
            op.name.cyan()
        };
        if op.fields.is_empty() {
            println!("{name}");
        } else {
            println!("{name} {}", op.fields.join(" ").dimmed());
        }
    }
    Ok(())
}

fn balances(rows: &[Amount]) {
    for amount in rows {
        println!("{:<4}{:>16} JPY", amount.entity.to_string().bold(), amount.balance);
    }
}

fn conservation(report: &ConservationReport) {
    balances(&report.balances);
    println!("Balance total: {}", report.balance_total);
    println!("Issued total:  {}", report.issued_total);
    if report.balanced {
        println!("{} Balances match issued funds", "✓".green().bold());
    } else {
        println!("{} Balances do not match issued funds", "✗".red().bold());
    }
}

fn state(state: ConfirmationState) -> String {
    match state {
        ConfirmationState::Pending => "pending".dimmed().to_string(),
        ConfirmationState::PartiallyConfirmed { confirmed } => {
            format!("{} ({confirmed}/3)", "partially confirmed".yellow())
        }
        ConfirmationState::FullyConfirmed => "fully confirmed".green().to_string(),
    }
}

fn project_record(project: &Project) -> anyhow::Result<()> {
    record(project)?;
    println!("{:<16}{}", "state", state(project.confirmation_state()));
    Ok(())
}

/// Print a flat record as one `field value` line per field, in declaration
/// order.
fn record<T: Serialize>(value: &T) -> anyhow::Result<()> {
    if let Value::Object(fields) = serde_json::to_value(value)? {
        for (name, field) in fields {
            let text = match field {
                Value::String(s) => s,
                other => other.to_string(),
            };
            println!("{:<16}{}", name.dimmed(), text);
        }
    }
    Ok(())
}

fn list<T: Serialize>(items: &[T]) -> anyhow::Result<()> {
    if items.is_empty() {
        println!("No records.");
    }
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            println!();
        }
        record(item)?;
    }
    Ok(())
}
