//! Bankprobe CLI - check that an open-banking sandbox returns data

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{client_token, config, logs, run, setup};

/// Bankprobe - open-banking sandbox diagnostics
#[derive(Parser)]
#[command(name = "bankprobe", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Exchange the authorization code, then list accounts and transactions
    Run {
        /// Fresh authorization code (overrides the configured one)
        #[arg(long, short)]
        code: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Request a client credentials token
    ClientToken {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Store Tink credentials in settings.json
    Setup {
        /// Client ID
        #[arg(long)]
        client_id: Option<String>,
        /// Client secret
        #[arg(long)]
        client_secret: Option<String>,
        /// Authorization code to store
        #[arg(long)]
        code: Option<String>,
        /// API base URL (sandbox proxy or mock server)
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Show the effective configuration
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// View and manage the event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if atty::isnt(atty::Stream::Stdout) {
        colored::control::set_override(false);
    }

    let result = dispatch(cli);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("Error: {:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        None => run::run(None, false),
        Some(Commands::Run { code, json }) => run::run(code.as_deref(), json),
        Some(Commands::ClientToken { json }) => client_token::run(json),
        Some(Commands::Setup { client_id, client_secret, code, base_url }) => {
            setup::run(client_id, client_secret, code, base_url)
        }
        Some(Commands::Config { json }) => config::run(json),
        Some(Commands::Logs { command }) => logs::run(command),
    }
}
