//! Run command - full diagnostic against the configured provider

use anyhow::Result;
use bankprobe_core::services::logging::STEP_FAILED_EVENT;
use bankprobe_core::services::report::intro_lines;
use bankprobe_core::{DiagnosticReport, LogEvent, LoggingService, Step, Verdict};

use super::{get_context, get_logger, log_event};
use crate::output;

/// Run the diagnostic
///
/// API failures are part of the report, not errors: the command only fails
/// when the context cannot be built.
pub fn run(code: Option<&str>, json: bool) -> Result<()> {
    let ctx = get_context(code)?;
    let logger = get_logger();
    log_event(&logger, LogEvent::new("command_executed").with_command("run"));

    if !json {
        output::print_lines(&intro_lines(ctx.runner.provider()));
    }

    let report = ctx.runner.run_diagnostic();
    log_report(&logger, &report);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output::print_lines(&report.lines());
    }

    Ok(())
}

fn log_report(logger: &Option<LoggingService>, report: &DiagnosticReport) {
    for (step, status, diagnostic) in report.failed_steps() {
        let mut event = LogEvent::new(STEP_FAILED_EVENT)
            .with_integration(report.provider.as_str())
            .with_command("run")
            .with_step(step.as_str())
            .with_http_status(status)
            .with_error(diagnostic);

        let details = match step {
            Step::Transactions => report
                .transactions
                .as_ref()
                .and_then(|t| t.error_details.as_ref()),
            _ => None,
        };
        if let Some(details) = details {
            event = event.with_error_details(details.to_string());
        }

        log_event(logger, event);
    }

    let outcome = match &report.verdict {
        Verdict::NoToken => "no_token",
        Verdict::NoAccounts => "no_accounts",
        Verdict::NoTransactions => "no_transactions",
        Verdict::TransactionsFound { .. } => "transactions_found",
    };
    log_event(
        logger,
        LogEvent::new("diagnostic_completed")
            .with_integration(report.provider.as_str())
            .with_command("run")
            .with_step(outcome),
    );
}
