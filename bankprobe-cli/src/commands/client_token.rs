//! Client-token command - client credentials grant on its own

use anyhow::Result;
use bankprobe_core::services::logging::STEP_FAILED_EVENT;
use bankprobe_core::services::report::client_token_lines;
use bankprobe_core::{LogEvent, Step};

use super::{get_context, get_logger, log_event};
use crate::output;

pub fn run(json: bool) -> Result<()> {
    let ctx = get_context(None)?;
    let logger = get_logger();
    log_event(&logger, LogEvent::new("command_executed").with_command("client-token"));

    let outcome = ctx.runner.obtain_client_token();

    if !outcome.success {
        log_event(
            &logger,
            LogEvent::new(STEP_FAILED_EVENT)
                .with_integration(ctx.runner.provider())
                .with_command("client-token")
                .with_step(Step::ClientToken.as_str())
                .with_http_status(outcome.status)
                .with_error(outcome.diagnostic.clone().unwrap_or_default()),
        );
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        output::print_lines(&client_token_lines(&outcome));
    }

    Ok(())
}
