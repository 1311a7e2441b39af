//! API flow runner - token exchange, then accounts, then transactions
//!
//! Each operation is a single blocking call whose result is returned as a
//! `CallOutcome`. A failed step stops the dependent steps of the same run;
//! nothing is retried and nothing is raised to the caller.

use std::sync::Arc;

use crate::domain::result::{parse_error_body, CallOutcome, Error, Result};
use crate::domain::{account_ids, AccessToken, Account, AuthorizationCode, Transaction};
use crate::ports::{ApiReply, OpenBankingApi};
use crate::services::report::{DiagnosticReport, Verdict};

/// Runs the authorization-code flow against an open-banking API
pub struct ApiFlowRunner {
    api: Arc<dyn OpenBankingApi>,
    code: AuthorizationCode,
}

fn into_outcome<T>(result: Result<ApiReply<T>>) -> CallOutcome<T> {
    result.map(|reply| (reply.status, reply.data)).into()
}

impl ApiFlowRunner {
    /// Create a runner for one authorization code
    pub fn new(api: Arc<dyn OpenBankingApi>, code: AuthorizationCode) -> Self {
        Self { api, code }
    }

    pub fn provider(&self) -> &str {
        self.api.name()
    }

    pub fn code(&self) -> &AuthorizationCode {
        &self.code
    }

    /// Client credentials grant
    ///
    /// Not part of `run_diagnostic`; available for manual testing.
    pub fn obtain_client_token(&self) -> CallOutcome<AccessToken> {
        into_outcome(self.api.client_credentials_token())
    }

    /// Exchange an authorization code for a user token
    ///
    /// An empty code fails without contacting the server.
    pub fn exchange_authorization_code(&self, code: &AuthorizationCode) -> CallOutcome<AccessToken> {
        if code.is_empty() {
            return CallOutcome::fail(&Error::validation("authorization code cannot be empty"));
        }
        into_outcome(self.api.exchange_code(code))
    }

    /// List accounts; a failure yields an outcome with no items
    pub fn fetch_accounts(&self, token: &AccessToken) -> CallOutcome<Vec<Account>> {
        into_outcome(self.api.list_accounts(token))
    }

    /// List transactions, filtered to `account_ids` when given
    ///
    /// When the server answered, the body is also parsed as JSON when possible.
    pub fn fetch_transactions(
        &self,
        token: &AccessToken,
        account_ids: Option<&[String]>,
    ) -> CallOutcome<Vec<Transaction>> {
        let request = self.api.describe_transactions_request(account_ids);

        match self.api.list_transactions(token, account_ids) {
            Ok(reply) => CallOutcome::ok(reply.status, reply.data).with_request(request),
            Err(e) => {
                let details = match &e {
                    Error::Http { body, .. } | Error::Decode { body, .. } => parse_error_body(body),
                    _ => None,
                };
                CallOutcome::fail(&e)
                    .with_request(request)
                    .with_error_details(details)
            }
        }
    }

    /// Exchange the configured code, then list accounts and their transactions
    pub fn run_diagnostic(&self) -> DiagnosticReport {
        let token_exchange = self.exchange_authorization_code(&self.code);

        let mut report = DiagnosticReport {
            provider: self.provider().to_string(),
            token_exchange,
            accounts: None,
            transactions: None,
            verdict: Verdict::NoToken,
        };

        let token = match report.token_exchange.data.clone() {
            Some(token) => token,
            None => return report,
        };

        let accounts = self.fetch_accounts(&token);
        let ids = account_ids(accounts.items());
        report.accounts = Some(accounts);

        if ids.is_empty() {
            report.verdict = Verdict::NoAccounts;
            return report;
        }

        let transactions = self.fetch_transactions(&token, Some(ids.as_slice()));
        let count = transactions.items().len();
        report.transactions = Some(transactions);

        report.verdict = if count == 0 {
            Verdict::NoTransactions
        } else {
            Verdict::TransactionsFound { count }
        };

        report
    }
}
