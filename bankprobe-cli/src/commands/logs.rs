//! Logs command - step history of past runs

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use super::ensure_probe_dir;
use crate::output;
use bankprobe_core::services::logging::{now_ms, LogEntry};
use bankprobe_core::{LogFilter, LoggingService};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Subcommand)]
pub enum LogsCommands {
    /// Show recorded events, newest first
    List {
        /// Only events for this step (client_token, exchange_code, accounts, transactions)
        #[arg(long)]
        step: Option<String>,
        /// Only failed events
        #[arg(long)]
        failures: bool,
        /// Number of entries to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show how often each step failed and how it last failed
    Steps {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete old log entries
    Clear {
        /// Delete logs older than N days
        #[arg(long, default_value = "30")]
        older_than_days: u64,
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
    },
}

fn get_logging_service() -> Result<LoggingService> {
    let probe_dir = ensure_probe_dir()?;
    LoggingService::new(&probe_dir, env!("CARGO_PKG_VERSION"))
}

fn format_timestamp(timestamp_ms: i64) -> String {
    use chrono::{TimeZone, Utc};
    Utc.timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}

fn format_status(status: Option<u16>) -> String {
    status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "no response".to_string())
}

/// Error bodies can span many lines; the table shows the first one
fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}

/// Step column: the flow step, or the verdict for a completed run
fn step_label(entry: &LogEntry) -> String {
    match entry.step.as_deref() {
        Some(step) if entry.event == "diagnostic_completed" => format!("=> {}", step),
        Some(step) => step.to_string(),
        None => entry.command.clone().unwrap_or_default(),
    }
}

pub fn run(command: LogsCommands) -> Result<()> {
    let service = get_logging_service()?;

    match command {
        LogsCommands::List {
            step,
            failures,
            limit,
            json,
        } => {
            let filter = LogFilter {
                step,
                failures_only: failures,
            };
            let entries = service.query(&filter, limit)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
                return Ok(());
            }

            if entries.is_empty() {
                println!("No log entries found.");
                return Ok(());
            }

            let mut table = output::create_table();
            table.set_header(vec!["Time", "Event", "Step", "Status", "Error"]);

            for entry in &entries {
                let status = match (entry.http_status, &entry.error_message) {
                    (None, None) => String::new(),
                    (status, _) => format_status(status),
                };
                let error = entry
                    .error_message
                    .as_deref()
                    .map(|e| first_line(e).red().to_string())
                    .unwrap_or_default();

                table.add_row(vec![
                    format_timestamp(entry.timestamp),
                    entry.event.clone(),
                    step_label(entry),
                    status,
                    error,
                ]);
            }

            println!("{}", table);
        }
        LogsCommands::Steps { json } => {
            let summary = service.step_failures()?;
            let (total, failed) = service.counts()?;

            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "total_entries": total,
                        "failed_entries": failed,
                        "steps": summary,
                        "database_path": service.db_path().to_string_lossy(),
                    })
                );
                return Ok(());
            }

            if summary.is_empty() {
                println!("{}", "No step failures recorded.".green());
            } else {
                let mut table = output::create_table();
                table.set_header(vec!["Step", "Failures", "Last failure", "Last status"]);
                for step in &summary {
                    table.add_row(vec![
                        step.step.clone(),
                        step.failures.to_string(),
                        format_timestamp(step.last_failed_at),
                        format_status(step.last_status),
                    ]);
                }
                println!("{}", table);
            }

            println!();
            println!("  Entries: {} ({} failed)", total, failed);
            println!("  Database: {}", service.db_path().display());
        }
        LogsCommands::Clear {
            older_than_days,
            force,
        } => {
            let cutoff_ms = now_ms() - (older_than_days as i64 * DAY_MS);

            if !force {
                use dialoguer::Confirm;
                if !Confirm::new()
                    .with_prompt(format!(
                        "Delete logs older than {} days?",
                        older_than_days
                    ))
                    .default(false)
                    .interact()?
                {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            let deleted = service.delete_before(cutoff_ms)?;
            println!("Deleted {} log entries", deleted);
        }
    }

    Ok(())
}
