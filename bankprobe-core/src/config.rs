//! Configuration management
//!
//! Settings live in `settings.json` inside the probe directory:
//! ```json
//! {
//!   "tink": {
//!     "clientId": "...",
//!     "clientSecret": "...",
//!     "authorizationCode": "...",
//!     "baseUrl": "https://api.tink.com"
//!   }
//! }
//! ```
//! Unknown keys are kept when saving. Each Tink value can be overridden with
//! an environment variable.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::adapters::tink::TINK_PRODUCTION_URL;
use crate::domain::{AuthorizationCode, Credentials};

pub const CLIENT_ID_ENV: &str = "BANKPROBE_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "BANKPROBE_CLIENT_SECRET";
pub const AUTH_CODE_ENV: &str = "BANKPROBE_AUTH_CODE";
/// Set this to use a sandbox proxy or a mock server
pub const BASE_URL_ENV: &str = "BANKPROBE_BASE_URL";

const SETTINGS_FILE: &str = "settings.json";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    tink: TinkSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TinkSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    authorization_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Probe configuration (effective values after environment overrides)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub client_id: String,
    pub client_secret: String,
    pub authorization_code: String,
    pub base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            authorization_code: String::new(),
            base_url: TINK_PRODUCTION_URL.to_string(),
        }
    }
}

/// Read settings.json; a missing file is empty, a malformed one is an error
fn read_settings(probe_dir: &Path) -> Result<SettingsFile> {
    let settings_path = probe_dir.join(SETTINGS_FILE);
    if !settings_path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = std::fs::read_to_string(&settings_path)
        .with_context(|| format!("Failed to read {}", settings_path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Malformed settings file: {}", settings_path.display()))
}

/// Environment value, ignoring unset and blank variables
fn env_override(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    /// Load config from the probe directory
    ///
    /// Values come from settings.json, then environment variables override
    /// them. A malformed settings file is treated as empty.
    pub fn load(probe_dir: &Path) -> Result<Self> {
        Self::load_with(probe_dir, env_override)
    }

    /// Load config with a custom override lookup (used by tests)
    pub fn load_with(probe_dir: &Path, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let raw = match read_settings(probe_dir) {
            Ok(raw) => raw,
            Err(e) if e.downcast_ref::<serde_json::Error>().is_some() => SettingsFile::default(),
            Err(e) => return Err(e),
        };
        Ok(Self::resolve(raw, lookup))
    }

    /// Load only the values stored in settings.json
    ///
    /// Environment overrides are ignored and a malformed file is an error, so
    /// the result is safe to write back with `save`.
    pub fn load_file(probe_dir: &Path) -> Result<Self> {
        Ok(Self::resolve(read_settings(probe_dir)?, |_| None))
    }

    fn resolve(raw: SettingsFile, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            client_id: lookup(CLIENT_ID_ENV)
                .or(raw.tink.client_id)
                .unwrap_or(defaults.client_id),
            client_secret: lookup(CLIENT_SECRET_ENV)
                .or(raw.tink.client_secret)
                .unwrap_or(defaults.client_secret),
            authorization_code: lookup(AUTH_CODE_ENV)
                .or(raw.tink.authorization_code)
                .unwrap_or(defaults.authorization_code),
            base_url: lookup(BASE_URL_ENV)
                .or(raw.tink.base_url)
                .unwrap_or(defaults.base_url),
        }
    }

    /// Save config to the probe directory
    ///
    /// Only the Tink values are written; other settings are preserved. A
    /// malformed settings file is left untouched and reported as an error.
    pub fn save(&self, probe_dir: &Path) -> Result<()> {
        let mut settings = read_settings(probe_dir)?;

        settings.tink.client_id = Some(self.client_id.clone());
        settings.tink.client_secret = Some(self.client_secret.clone());
        settings.tink.authorization_code =
            Some(self.authorization_code.clone()).filter(|c| !c.is_empty());
        settings.tink.base_url =
            Some(self.base_url.clone()).filter(|u| u != TINK_PRODUCTION_URL);

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(probe_dir.join(SETTINGS_FILE), content)?;
        Ok(())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.client_id.clone(), self.client_secret.clone())
    }

    pub fn authorization_code(&self) -> AuthorizationCode {
        AuthorizationCode::new(self.authorization_code.clone())
    }

    /// Client secret with all but the last four characters masked
    pub fn masked_secret(&self) -> String {
        let chars: Vec<char> = self.client_secret.chars().collect();
        if chars.len() <= 4 {
            return "*".repeat(chars.len());
        }
        let visible: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{}", "*".repeat(chars.len() - 4), visible)
    }
}
