//! Diagnostic report - what each step returned and what it means
//!
//! The flow runner only produces data. This module turns that data into
//! leveled lines; the CLI decides how to print them.

use std::fmt::Display;

use serde::Serialize;

use crate::domain::result::CallOutcome;
use crate::domain::{AccessToken, Account, Transaction};

/// How many transactions are listed in the report
pub const TRANSACTION_PREVIEW_LIMIT: usize = 5;

/// One step of the flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    ClientToken,
    ExchangeCode,
    Accounts,
    Transactions,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::ClientToken => "client_token",
            Step::ExchangeCode => "exchange_code",
            Step::Accounts => "accounts",
            Step::Transactions => "transactions",
        }
    }
}

/// Conclusion of a diagnostic run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Verdict {
    /// Code exchange failed; a fresh authorization code is needed
    NoToken,
    /// Token obtained but the accounts list was empty or failed
    NoAccounts,
    /// Accounts exist but no transactions came back: the sandbox symptom
    NoTransactions,
    TransactionsFound { count: usize },
}

/// Everything a diagnostic run did, in order
///
/// A step that was never attempted is `None`.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticReport {
    pub provider: String,
    pub token_exchange: CallOutcome<AccessToken>,
    pub accounts: Option<CallOutcome<Vec<Account>>>,
    pub transactions: Option<CallOutcome<Vec<Transaction>>>,
    pub verdict: Verdict,
}

impl DiagnosticReport {
    /// Steps that were attempted and failed, with status and diagnostic
    pub fn failed_steps(&self) -> Vec<(Step, Option<u16>, String)> {
        let mut failed = Vec::new();

        if !self.token_exchange.success {
            failed.push(failure(Step::ExchangeCode, &self.token_exchange));
        }
        if let Some(accounts) = self.accounts.as_ref().filter(|o| !o.success) {
            failed.push(failure(Step::Accounts, accounts));
        }
        if let Some(transactions) = self.transactions.as_ref().filter(|o| !o.success) {
            failed.push(failure(Step::Transactions, transactions));
        }

        failed
    }

    /// Full report, in the order the steps ran
    pub fn lines(&self) -> Vec<ReportLine> {
        let mut lines = token_exchange_lines(&self.token_exchange);

        if let Some(accounts) = &self.accounts {
            lines.push(ReportLine::blank());
            lines.extend(accounts_lines(accounts));
        }

        if let Some(transactions) = &self.transactions {
            lines.push(ReportLine::blank());
            lines.extend(transactions_lines(transactions));
        }

        lines.push(ReportLine::blank());
        lines.extend(verdict_lines(&self.verdict));
        lines
    }
}

fn failure<T>(step: Step, outcome: &CallOutcome<T>) -> (Step, Option<u16>, String) {
    (
        step,
        outcome.status,
        outcome.diagnostic.clone().unwrap_or_default(),
    )
}

/// Severity of a report line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single line of human-readable output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportLine {
    pub level: LineLevel,
    pub text: String,
}

impl ReportLine {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: LineLevel::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: LineLevel::Success,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: LineLevel::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: LineLevel::Error,
            text: text.into(),
        }
    }

    pub fn blank() -> Self {
        Self::info("")
    }
}

fn or_na<T: Display>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

fn status_text(status: Option<u16>) -> String {
    status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "no response".to_string())
}

fn error_line<T>(outcome: &CallOutcome<T>) -> ReportLine {
    ReportLine::error(format!(
        "Error: {}",
        outcome.diagnostic.as_deref().unwrap_or("")
    ))
}

/// Note printed before a run that uses a stored code
pub fn intro_lines(provider: &str) -> Vec<ReportLine> {
    vec![
        ReportLine::info(format!("=== Testing {} API ===", provider)),
        ReportLine::blank(),
        ReportLine::warning("NOTE: Authorization codes are single-use and expire quickly"),
        ReportLine::warning("A stored code has most likely expired; pass a fresh one with --code"),
        ReportLine::blank(),
    ]
}

/// Lines for the client credentials grant
pub fn client_token_lines(outcome: &CallOutcome<AccessToken>) -> Vec<ReportLine> {
    let mut lines = vec![ReportLine::info(format!(
        "Client token response: {}",
        status_text(outcome.status)
    ))];

    match &outcome.data {
        Some(token) => {
            lines.push(ReportLine::success(format!(
                "Client token obtained: {}",
                token.preview()
            )));
        }
        None => lines.push(error_line(outcome)),
    }

    lines
}

/// Lines for the authorization code exchange
pub fn token_exchange_lines(outcome: &CallOutcome<AccessToken>) -> Vec<ReportLine> {
    let mut lines = vec![ReportLine::info(format!(
        "Exchange code response: {}",
        status_text(outcome.status)
    ))];

    match &outcome.data {
        Some(token) => {
            lines.push(ReportLine::success("User token obtained"));
            lines.push(ReportLine::info(format!("Scopes: {}", or_na(token.scope.as_ref()))));
        }
        None => lines.push(error_line(outcome)),
    }

    lines
}

/// Format one account as `name (id): balance currency`
pub fn account_summary(account: &Account) -> String {
    format!(
        "  - {} ({}): {} {}",
        or_na(account.name.as_ref()),
        account.id,
        or_na(account.balance.as_ref()),
        or_na(account.currency_code.as_ref())
    )
}

/// Lines for the accounts listing, one per account
pub fn accounts_lines(outcome: &CallOutcome<Vec<Account>>) -> Vec<ReportLine> {
    let mut lines = vec![ReportLine::info(format!(
        "Accounts response: {}",
        status_text(outcome.status)
    ))];

    if !outcome.success {
        lines.push(error_line(outcome));
        return lines;
    }

    let accounts = outcome.items();
    lines.push(ReportLine::info(format!("Found {} accounts", accounts.len())));
    lines.extend(accounts.iter().map(|a| ReportLine::info(account_summary(a))));
    lines
}

/// Format one transaction as `date: description - amount currency`
pub fn transaction_summary(tx: &Transaction) -> String {
    format!(
        "  - {}: {} - {} {}",
        or_na(tx.date.as_ref()),
        or_na(tx.description.as_ref()),
        or_na(tx.amount.as_ref()),
        or_na(tx.currency_code.as_ref())
    )
}

/// Lines for the transactions listing
///
/// The count reflects every transaction returned; only the first
/// `TRANSACTION_PREVIEW_LIMIT` are listed.
pub fn transactions_lines(outcome: &CallOutcome<Vec<Transaction>>) -> Vec<ReportLine> {
    let mut lines = Vec::new();

    if let Some(request) = &outcome.request {
        lines.push(ReportLine::info(format!(
            "Requesting transactions from: {}",
            request
        )));
    }
    lines.push(ReportLine::info(format!(
        "Transactions response: {}",
        status_text(outcome.status)
    )));

    if !outcome.success {
        lines.push(error_line(outcome));
        if let Some(details) = &outcome.error_details {
            let pretty =
                serde_json::to_string_pretty(details).unwrap_or_else(|_| details.to_string());
            lines.push(ReportLine::error(format!("Error details: {}", pretty)));
        }
        return lines;
    }

    let transactions = outcome.items();
    lines.push(ReportLine::info(format!(
        "Found {} transactions",
        transactions.len()
    )));
    lines.extend(
        transactions
            .iter()
            .take(TRANSACTION_PREVIEW_LIMIT)
            .map(|tx| ReportLine::info(transaction_summary(tx))),
    );
    lines
}

/// Closing diagnosis or remediation hint
pub fn verdict_lines(verdict: &Verdict) -> Vec<ReportLine> {
    match verdict {
        Verdict::NoToken => vec![
            ReportLine::warning("Could not get user token (code likely expired)"),
            ReportLine::blank(),
            ReportLine::info("To test with a fresh token:"),
            ReportLine::info("1. Start the bank connection from your app"),
            ReportLine::info("2. Complete the Tink Link flow"),
            ReportLine::info("3. From the callback URL, copy the 'code' parameter"),
            ReportLine::info("4. Run again with --code <CODE> (or update authorizationCode in settings.json)"),
        ],
        Verdict::NoAccounts => vec![ReportLine::warning("No accounts found")],
        Verdict::NoTransactions => vec![
            ReportLine::warning("No transactions found in sandbox accounts"),
            ReportLine::info(
                "This is likely the issue - sandbox demo bank accounts may not have test transactions",
            ),
        ],
        Verdict::TransactionsFound { count } => vec![ReportLine::success(format!(
            "{} transactions available; the sandbox is returning data",
            count
        ))],
    }
}
