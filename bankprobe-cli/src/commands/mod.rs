//! CLI command implementations

pub mod client_token;
pub mod config;
pub mod logs;
pub mod run;
pub mod setup;

use std::path::PathBuf;

use anyhow::{Context, Result};
use bankprobe_core::{LogEvent, LoggingService, ProbeContext};

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<LoggingService> {
    let probe_dir = get_probe_dir().ok()?;
    std::fs::create_dir_all(&probe_dir).ok()?;
    LoggingService::new(&probe_dir, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Get the probe directory from environment or default
pub fn get_probe_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("BANKPROBE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".bankprobe"))
        .context("Could not find home directory; set BANKPROBE_DIR")
}

/// Create the probe directory if needed and return it
pub fn ensure_probe_dir() -> Result<PathBuf> {
    let probe_dir = get_probe_dir()?;
    std::fs::create_dir_all(&probe_dir)
        .with_context(|| format!("Failed to create probe directory: {:?}", probe_dir))?;
    Ok(probe_dir)
}

/// Build the probe context, optionally replacing the stored code
pub fn get_context(code_override: Option<&str>) -> Result<ProbeContext> {
    let probe_dir = ensure_probe_dir()?;
    ProbeContext::new(&probe_dir, code_override).context("Failed to initialize probe context")
}
