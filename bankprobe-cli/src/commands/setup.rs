//! Setup command - store Tink credentials

use anyhow::Result;
use bankprobe_core::config::Config;
use bankprobe_core::LogEvent;
use colored::Colorize;
use dialoguer::{Input, Password};

use super::{ensure_probe_dir, get_logger, log_event};

pub fn run(
    client_id: Option<String>,
    client_secret: Option<String>,
    code: Option<String>,
    base_url: Option<String>,
) -> Result<()> {
    let probe_dir = ensure_probe_dir()?;
    // Stored values only: environment overrides must not end up in the file
    let mut config = Config::load_file(&probe_dir)?;

    config.client_id = match client_id {
        Some(id) => id,
        None => Input::new()
            .with_prompt("Tink client ID")
            .with_initial_text(config.client_id.clone())
            .interact_text()?,
    }
    .trim()
    .to_string();

    config.client_secret = match client_secret {
        Some(secret) => secret,
        None => Password::new()
            .with_prompt("Tink client secret")
            .interact()?,
    }
    .trim()
    .to_string();

    if let Some(code) = code {
        config.authorization_code = code.trim().to_string();
    }

    if let Some(base_url) = base_url {
        config.base_url = base_url.trim().trim_end_matches('/').to_string();
    }

    if config.client_id.is_empty() || config.client_secret.is_empty() {
        anyhow::bail!("Client ID and client secret are both required");
    }

    config.save(&probe_dir)?;
    log_event(
        &get_logger(),
        LogEvent::new("setup_completed")
            .with_integration("tink")
            .with_command("setup"),
    );

    println!("{} Tink credentials saved", "Success!".green());
    println!("Run 'bankprobe run --code <CODE>' with a fresh authorization code.");

    Ok(())
}
