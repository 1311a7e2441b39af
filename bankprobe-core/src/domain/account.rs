//! Account domain model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A bank account as reported by the provider
///
/// Read-only: every field comes from the accounts list response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: Option<String>,
    pub balance: Option<Decimal>,
    /// ISO 4217 currency code as sent by the provider
    pub currency_code: Option<String>,
}

impl Account {
    /// Create an account with just an ID
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            balance: None,
            currency_code: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_balance(mut self, balance: Decimal, currency_code: impl Into<String>) -> Self {
        self.balance = Some(balance);
        self.currency_code = Some(currency_code.into());
        self
    }
}

/// Account IDs in the order the accounts were listed
pub fn account_ids(accounts: &[Account]) -> Vec<String> {
    accounts.iter().map(|a| a.id.clone()).collect()
}
