//! Bankprobe Core - open-banking sandbox diagnostics
//!
//! This crate follows a hexagonal layout:
//!
//! - **domain**: Credentials, tokens, accounts, transactions, call outcomes
//! - **ports**: The `OpenBankingApi` trait the flow depends on
//! - **services**: Flow runner, diagnostic report, event logging
//! - **adapters**: Concrete implementations (Tink HTTP client)

pub mod domain;
pub mod ports;
pub mod services;
pub mod adapters;
pub mod config;
pub mod log_migrations;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use adapters::tink::TinkClient;
use config::Config;
use services::ApiFlowRunner;

// Re-export commonly used types at crate root
pub use domain::{AccessToken, Account, AuthorizationCode, Credentials, Transaction};
pub use domain::result::{CallOutcome, Error};
pub use services::{
    DiagnosticReport, LineLevel, LogEntry, LogEvent, LogFilter, LoggingService, ReportLine, Step,
    Verdict,
};

/// Main context for probe operations
///
/// Holds the effective configuration and a flow runner wired to the Tink
/// client built from it.
pub struct ProbeContext {
    pub config: Config,
    pub runner: ApiFlowRunner,
}

impl ProbeContext {
    /// Create a context from the probe directory
    ///
    /// `code_override` replaces the configured authorization code for this
    /// run only.
    pub fn new(probe_dir: &Path, code_override: Option<&str>) -> Result<Self> {
        let mut config = Config::load(probe_dir)?;
        if let Some(code) = code_override {
            config.authorization_code = code.trim().to_string();
        }
        Self::from_config(config)
    }

    /// Create a context from an already loaded configuration
    pub fn from_config(config: Config) -> Result<Self> {
        let client = TinkClient::new_with_base_url(config.credentials(), &config.base_url)?;
        let runner = ApiFlowRunner::new(Arc::new(client), config.authorization_code());

        Ok(Self { config, runner })
    }
}
