//! Tink API client
//!
//! Handles the OAuth token endpoint and the v1 account and transaction
//! listings. Each call is one blocking request; nothing is retried.
//!
//! API Documentation: https://docs.tink.com/api

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::blocking::{Client, Response};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use url::Url;

use crate::domain::result::{Error, Result};
use crate::domain::{AccessToken, Account, AuthorizationCode, Credentials, Transaction};
use crate::ports::{ApiReply, OpenBankingApi, CLIENT_CREDENTIALS_SCOPES};

// =============================================================================
// API Response Models (matching Tink v1 API)
// =============================================================================

/// Wrapper for accounts list response
#[derive(Debug, Clone, Deserialize)]
struct AccountsResponse {
    #[serde(default)]
    accounts: Vec<TinkAccount>,
}

/// Tink account from API
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TinkAccount {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_amount")]
    pub balance: Option<Decimal>,
    #[serde(default)]
    pub currency_code: Option<String>,
}

/// Wrapper for transactions list response
#[derive(Debug, Clone, Deserialize)]
struct TransactionsResponse {
    #[serde(default)]
    transactions: Vec<TinkTransaction>,
}

/// Tink transaction from API
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TinkTransaction {
    /// Epoch milliseconds in v1, ISO date in some sandbox payloads
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_amount")]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub currency_code: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub account_id: Option<String>,
}

/// Deserialize ID that can be number or string
fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value: JsonValue = Deserialize::deserialize(deserializer)?;
    match value {
        JsonValue::Number(n) => Ok(n.to_string()),
        JsonValue::String(s) => Ok(s),
        _ => Err(D::Error::custom("expected number or string for id")),
    }
}

/// Deserialize optional ID that can be number or string
fn deserialize_optional_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value: Option<JsonValue> = Option::deserialize(deserializer)?;
    match value {
        Some(JsonValue::Number(n)) => Ok(Some(n.to_string())),
        Some(JsonValue::String(s)) => Ok(Some(s)),
        Some(JsonValue::Null) | None => Ok(None),
        _ => Err(D::Error::custom("expected number or string for id")),
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    s.parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_scientific(s).ok())
}

/// Deserialize optional amount that can be number or string
fn deserialize_optional_amount<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value: Option<JsonValue> = Option::deserialize(deserializer)?;
    match value {
        Some(JsonValue::Number(n)) => parse_decimal(&n.to_string())
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid decimal: {}", n))),
        Some(JsonValue::String(s)) => parse_decimal(s.trim())
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid decimal: {}", s))),
        Some(JsonValue::Null) | None => Ok(None),
        _ => Err(D::Error::custom("expected number or string for amount")),
    }
}

/// Deserialize optional date given as epoch milliseconds or YYYY-MM-DD
fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value: Option<JsonValue> = Option::deserialize(deserializer)?;
    match value {
        Some(JsonValue::Number(n)) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| Some(dt.date_naive()))
            .ok_or_else(|| D::Error::custom(format!("invalid epoch milliseconds: {}", n))),
        Some(JsonValue::String(s)) => {
            // Accept full timestamps by keeping the date part
            let date_part = s.get(..10).unwrap_or(s.as_str());
            NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
                .map(Some)
                .map_err(|e| D::Error::custom(format!("invalid date '{}': {}", s, e)))
        }
        Some(JsonValue::Null) | None => Ok(None),
        _ => Err(D::Error::custom("expected number or string for date")),
    }
}

// =============================================================================
// Tink HTTP Client
// =============================================================================

/// Default production API URL
pub const TINK_PRODUCTION_URL: &str = "https://api.tink.com";

const TOKEN_PATH: &str = "/api/v1/oauth/token";
const ACCOUNTS_PATH: &str = "/api/v1/accounts/list";
const TRANSACTIONS_PATH: &str = "/api/v1/transactions/list";

/// Query parameter used to filter transactions by account
pub const ACCOUNT_FILTER_PARAM: &str = "accountIdIn";

/// Tink API client
#[derive(Debug)]
pub struct TinkClient {
    client: Client,
    credentials: Credentials,
    base_url: String,
}

impl TinkClient {
    /// Create a new client against the production API
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::new_with_base_url(credentials, TINK_PRODUCTION_URL)
    }

    /// Create a new client with a custom base URL (sandbox proxy, mock server)
    pub fn new_with_base_url(credentials: Credentials, base_url: &str) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|e| Error::config(format!("Invalid API base URL '{}': {}", base_url, e)))?;

        // Client defaults apply, including the timeout
        let client = Client::builder()
            .build()
            .map_err(|e| Error::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            credentials,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Build the transactions list URL with one `accountIdIn` per ID, in order
    pub fn transactions_url(&self, account_ids: Option<&[String]>) -> Result<Url> {
        let endpoint = self.endpoint(TRANSACTIONS_PATH);
        let mut url = Url::parse(&endpoint)
            .map_err(|e| Error::config(format!("Invalid URL '{}': {}", endpoint, e)))?;

        if let Some(ids) = account_ids.filter(|ids| !ids.is_empty()) {
            let mut pairs = url.query_pairs_mut();
            for id in ids {
                pairs.append_pair(ACCOUNT_FILTER_PARAM, id);
            }
        }

        Ok(url)
    }

    /// POST a form to the token endpoint
    fn request_token(&self, form: &[(&str, &str)]) -> Result<ApiReply<AccessToken>> {
        if !self.credentials.is_complete() {
            return Err(Error::config("Client ID and client secret must be configured"));
        }

        let response = self
            .client
            .post(self.endpoint(TOKEN_PATH))
            .form(form)
            .send()
            .map_err(|e| self.map_request_error(e))?;

        let response = self.check_response_status(response)?;
        self.read_json(response, "token")
    }

    /// Read the body as text, then decode it
    ///
    /// A body that does not decode keeps its status and raw text.
    fn read_json<T: DeserializeOwned>(
        &self,
        response: Response,
        what: &str,
    ) -> Result<ApiReply<T>> {
        let status = response.status().as_u16();
        let body = response.text().map_err(|e| self.map_request_error(e))?;

        let parsed = serde_json::from_str::<T>(&body);
        match parsed {
            Ok(data) => Ok(ApiReply::new(status, data)),
            Err(e) => Err(Error::Decode {
                status,
                message: format!("Failed to parse {} response: {}", what, e),
                body,
            }),
        }
    }

    /// GET an authenticated resource
    fn get_authorized(&self, url: &str, token: &AccessToken) -> Result<Response> {
        let response = self
            .client
            .get(url)
            .bearer_auth(token.secret())
            .send()
            .map_err(|e| self.map_request_error(e))?;

        self.check_response_status(response)
    }

    /// Map Tink account to domain Account
    fn map_account(&self, account: TinkAccount) -> Account {
        Account {
            id: account.id,
            name: account.name,
            balance: account.balance,
            currency_code: account.currency_code,
        }
    }

    /// Map Tink transaction to domain Transaction
    fn map_transaction(&self, tx: TinkTransaction) -> Transaction {
        Transaction {
            date: tx.date,
            description: tx.description,
            amount: tx.amount,
            currency_code: tx.currency_code,
            account_id: tx.account_id,
        }
    }

    /// Map request errors to user-friendly messages
    fn map_request_error(&self, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::Transport("Connection timed out".to_string())
        } else if error.is_connect() {
            Error::Transport(format!("Unable to connect to {}", self.base_url))
        } else {
            Error::Transport(format!("Tink request failed: {}", error))
        }
    }

    /// Pass success responses through; turn anything else into `Error::Http`
    /// carrying the raw body
    fn check_response_status(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        Err(Error::Http {
            status: status.as_u16(),
            body,
        })
    }
}

impl OpenBankingApi for TinkClient {
    fn name(&self) -> &str {
        "tink"
    }

    fn client_credentials_token(&self) -> Result<ApiReply<AccessToken>> {
        self.request_token(&[
            ("client_id", self.credentials.client_id()),
            ("client_secret", self.credentials.client_secret()),
            ("grant_type", "client_credentials"),
            ("scope", CLIENT_CREDENTIALS_SCOPES),
        ])
    }

    fn exchange_code(&self, code: &AuthorizationCode) -> Result<ApiReply<AccessToken>> {
        let code = code.require()?;
        self.request_token(&[
            ("code", code),
            ("client_id", self.credentials.client_id()),
            ("client_secret", self.credentials.client_secret()),
            ("grant_type", "authorization_code"),
        ])
    }

    fn list_accounts(&self, token: &AccessToken) -> Result<ApiReply<Vec<Account>>> {
        let response = self.get_authorized(&self.endpoint(ACCOUNTS_PATH), token)?;
        let reply: ApiReply<AccountsResponse> = self.read_json(response, "accounts")?;

        Ok(reply.map(|r| r.accounts.into_iter().map(|a| self.map_account(a)).collect()))
    }

    fn list_transactions(
        &self,
        token: &AccessToken,
        account_ids: Option<&[String]>,
    ) -> Result<ApiReply<Vec<Transaction>>> {
        let url = self.transactions_url(account_ids)?;
        let response = self.get_authorized(url.as_str(), token)?;
        let reply: ApiReply<TransactionsResponse> = self.read_json(response, "transactions")?;

        Ok(reply.map(|r| {
            r.transactions
                .into_iter()
                .map(|tx| self.map_transaction(tx))
                .collect()
        }))
    }

    fn describe_transactions_request(&self, account_ids: Option<&[String]>) -> String {
        self.transactions_url(account_ids)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| self.endpoint(TRANSACTIONS_PATH))
    }
}

// =============================================================================
// Tests
// =============================================================================
