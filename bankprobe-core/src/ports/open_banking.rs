//! Open-banking API port
//!
//! Defines the calls the flow runner makes against the provider. The Tink
//! HTTP client implements it for real runs; tests substitute scripted fakes.

use crate::domain::result::Result;
use crate::domain::{AccessToken, Account, AuthorizationCode, Transaction};

/// Scopes requested by the client credentials grant
pub const CLIENT_CREDENTIALS_SCOPES: &str = "authorization:grant,user:create";

/// A successful reply: HTTP status plus decoded payload
#[derive(Debug, Clone, PartialEq)]
pub struct ApiReply<T> {
    pub status: u16,
    pub data: T,
}

impl<T> ApiReply<T> {
    pub fn new(status: u16, data: T) -> Self {
        Self { status, data }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiReply<U> {
        ApiReply {
            status: self.status,
            data: f(self.data),
        }
    }
}

/// Open-banking API trait
///
/// Every method is a single blocking request. Any non-success status must be
/// returned as `Error::Http` carrying the raw body; implementations never
/// retry.
pub trait OpenBankingApi: Send + Sync {
    /// Provider name (e.g., "tink")
    fn name(&self) -> &str;

    /// Client credentials grant with `CLIENT_CREDENTIALS_SCOPES`
    fn client_credentials_token(&self) -> Result<ApiReply<AccessToken>>;

    /// Authorization code grant
    fn exchange_code(&self, code: &AuthorizationCode) -> Result<ApiReply<AccessToken>>;

    /// List the accounts visible to the token, in response order
    fn list_accounts(&self, token: &AccessToken) -> Result<ApiReply<Vec<Account>>>;

    /// List transactions, filtered to `account_ids` when given
    fn list_transactions(
        &self,
        token: &AccessToken,
        account_ids: Option<&[String]>,
    ) -> Result<ApiReply<Vec<Transaction>>>;

    /// Describe the transactions request without sending it
    fn describe_transactions_request(&self, account_ids: Option<&[String]>) -> String;
}
