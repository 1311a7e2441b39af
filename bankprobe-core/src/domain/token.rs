//! Access tokens issued by the authorization server

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of characters shown when a token is displayed
const PREVIEW_LEN: usize = 20;

/// Bearer token plus the scope it was granted
///
/// The token is only used for the current run. `expires_in` is kept for
/// display; nothing checks it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    /// Never written out; reports only show `preview()`
    #[serde(skip_serializing, deserialize_with = "deserialize_non_empty")]
    pub access_token: String,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

fn deserialize_non_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value = String::deserialize(deserializer)?;
    if value.is_empty() {
        return Err(D::Error::custom("access_token is empty"));
    }
    Ok(value)
}

impl AccessToken {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            scope: None,
            token_type: None,
            expires_in: None,
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Raw bearer value for the Authorization header
    pub fn secret(&self) -> &str {
        &self.access_token
    }

    /// First characters of the token followed by an ellipsis
    pub fn preview(&self) -> String {
        let prefix: String = self.access_token.chars().take(PREVIEW_LEN).collect();
        format!("{}...", prefix)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &self.preview())
            .field("scope", &self.scope)
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}
