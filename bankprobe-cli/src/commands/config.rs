//! Config command - show the effective configuration

use anyhow::Result;
use bankprobe_core::config::Config;
use colored::Colorize;

use super::get_probe_dir;
use crate::output;

fn or_unset(value: &str) -> String {
    if value.is_empty() {
        "(not set)".to_string()
    } else {
        value.to_string()
    }
}

pub fn run(json: bool) -> Result<()> {
    let probe_dir = get_probe_dir()?;
    let config = Config::load(&probe_dir)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "probe_dir": probe_dir.to_string_lossy(),
                "client_id": config.client_id,
                "client_secret": config.masked_secret(),
                "authorization_code": config.authorization_code,
                "base_url": config.base_url,
            }))?
        );
        return Ok(());
    }

    println!("{}", "Configuration".bold());
    println!();

    let mut table = output::create_table();
    table.add_row(vec!["Directory".to_string(), probe_dir.display().to_string()]);
    table.add_row(vec!["Client ID".to_string(), or_unset(&config.client_id)]);
    table.add_row(vec!["Client secret".to_string(), or_unset(&config.masked_secret())]);
    table.add_row(vec![
        "Authorization code".to_string(),
        or_unset(&config.authorization_code),
    ]);
    table.add_row(vec!["Base URL".to_string(), config.base_url.clone()]);
    println!("{}", table);

    if !config.credentials().is_complete() {
        println!();
        output::warning("Credentials are incomplete. Run 'bankprobe setup' first.");
    }

    Ok(())
}
