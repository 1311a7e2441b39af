//! Mock Tink API server for testing
//!
//! Serves the three endpoints the flow uses with the same response shapes as
//! the real API:
//! - POST /api/v1/oauth/token returns { access_token, scope, ... }
//! - GET /api/v1/accounts/list returns { accounts: [...] }
//! - GET /api/v1/transactions/list returns { transactions: [...] }
//!
//! Every request line is recorded so tests can check what was sent.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use chrono::{Duration, TimeZone, Utc};
use serde::Serialize;

/// Client ID the mock accepts
pub const MOCK_CLIENT_ID: &str = "mock_client";
/// Token issued by the client credentials grant
pub const MOCK_CLIENT_TOKEN: &str = "mock_client_token_0123456789";

/// Mock Tink server for testing
pub struct MockTinkServer {
    port: u16,
    running: Arc<AtomicBool>,
    requests: Arc<Mutex<Vec<String>>>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

/// Configuration for mock responses
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Authorization code accepted by the token endpoint
    pub valid_code: String,
    /// Token issued for `valid_code`
    pub access_token: String,
    /// Number of accounts to list
    pub num_accounts: usize,
    /// Number of transactions per requested account
    pub num_transactions_per_account: usize,
    /// Answer the accounts list with 401
    pub fail_accounts: bool,
    /// Answer the transactions list with this status and body
    pub transactions_error: Option<(u16, String)>,
    /// Answer the accounts list with 200 and this raw body
    pub accounts_body: Option<String>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            valid_code: "fresh_code".to_string(),
            access_token: "mock_user_token".to_string(),
            num_accounts: 2,
            num_transactions_per_account: 4,
            fail_accounts: false,
            transactions_error: None,
            accounts_body: None,
        }
    }
}

#[derive(Serialize)]
struct TokenResponse<'a> {
    access_token: &'a str,
    token_type: &'a str,
    expires_in: u64,
    scope: &'a str,
}

#[derive(Serialize)]
struct AccountsResponse {
    accounts: Vec<MockAccount>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MockAccount {
    id: String,
    name: String,
    balance: f64,
    currency_code: String,
}

#[derive(Serialize)]
struct TransactionsResponse {
    transactions: Vec<MockTransaction>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MockTransaction {
    id: String,
    account_id: String,
    /// Epoch milliseconds, as the v1 API sends it
    date: i64,
    description: String,
    amount: f64,
    currency_code: String,
}

impl MockTinkServer {
    /// Start a new mock server on a random available port
    pub fn start(config: MockConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let requests_clone = requests.clone();

        // Non-blocking accept so the loop can notice shutdown
        listener.set_nonblocking(true)?;

        let thread_handle = thread::spawn(move || {
            while running_clone.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        let cfg = config.clone();
                        let log = requests_clone.clone();
                        thread::spawn(move || {
                            handle_connection(stream, &cfg, &log);
                        });
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(std::time::Duration::from_millis(10));
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            port,
            running,
            requests,
            thread_handle: Some(thread_handle),
        })
    }

    /// Get the base URL for this mock server
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Request lines received so far, e.g. `GET /api/v1/accounts/list`
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MockTinkServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Read headers plus a body of Content-Length bytes
fn read_request(stream: &mut TcpStream) -> Option<String> {
    let mut data = Vec::new();
    let mut buffer = [0; 4096];

    loop {
        let n = stream.read(&mut buffer).ok()?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buffer[..n]);

        if let Some(header_end) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&data[..header_end]).to_lowercase();
            let content_length = headers
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if data.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }

    Some(String::from_utf8_lossy(&data).into_owned())
}

fn form_value<'a>(body: &'a str, key: &str) -> Option<&'a str> {
    body.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then_some(v)
    })
}

fn handle_connection(mut stream: TcpStream, config: &MockConfig, log: &Mutex<Vec<String>>) {
    // Accepted sockets inherit non-blocking mode on some platforms
    let _ = stream.set_nonblocking(false);

    let request = match read_request(&mut stream) {
        Some(r) => r,
        None => return,
    };

    let first_line = request.lines().next().unwrap_or("");
    let parts: Vec<&str> = first_line.split_whitespace().collect();

    if parts.len() < 2 {
        send_response(&mut stream, 400, "Bad Request", r#"{"errorMessage": "Invalid request"}"#);
        return;
    }

    let method = parts[0];
    let path = parts[1];
    if let Ok(mut entries) = log.lock() {
        entries.push(format!("{} {}", method, path));
    }

    let body = request.split("\r\n\r\n").nth(1).unwrap_or("");
    let request_lower = request.to_lowercase();
    let (path_without_query, query) = path.split_once('?').unwrap_or((path, ""));

    match (method, path_without_query) {
        ("POST", "/api/v1/oauth/token") => handle_token(&mut stream, config, body),
        ("GET", "/api/v1/accounts/list") => {
            if !is_authorized(&request_lower, config) || config.fail_accounts {
                send_response(
                    &mut stream,
                    401,
                    "Unauthorized",
                    r#"{"errorMessage": "Access token is invalid or expired", "errorCode": "oauth.unauthorized"}"#,
                );
                return;
            }
            if let Some(raw) = &config.accounts_body {
                send_response(&mut stream, 200, "OK", raw);
                return;
            }
            let response = AccountsResponse {
                accounts: generate_mock_accounts(config.num_accounts),
            };
            let json = serde_json::to_string(&response).unwrap();
            send_response(&mut stream, 200, "OK", &json);
        }
        ("GET", "/api/v1/transactions/list") => {
            if !is_authorized(&request_lower, config) {
                send_response(&mut stream, 401, "Unauthorized", r#"{"errorMessage": "Unauthorized"}"#);
                return;
            }
            if let Some((status, error_body)) = &config.transactions_error {
                send_response(&mut stream, *status, "Error", error_body);
                return;
            }
            let account_ids: Vec<&str> = query
                .split('&')
                .filter_map(|pair| pair.strip_prefix("accountIdIn="))
                .collect();
            let response = TransactionsResponse {
                transactions: generate_mock_transactions(
                    &account_ids,
                    config.num_transactions_per_account,
                ),
            };
            let json = serde_json::to_string(&response).unwrap();
            send_response(&mut stream, 200, "OK", &json);
        }
        _ => send_response(
            &mut stream,
            404,
            "Not Found",
            r#"{"errorMessage": "Endpoint not found"}"#,
        ),
    }
}

fn is_authorized(request_lower: &str, config: &MockConfig) -> bool {
    let user = format!("authorization: bearer {}", config.access_token.to_lowercase());
    let client = format!("authorization: bearer {}", MOCK_CLIENT_TOKEN);
    request_lower.contains(&user) || request_lower.contains(&client)
}

fn handle_token(stream: &mut TcpStream, config: &MockConfig, body: &str) {
    if form_value(body, "client_id") != Some(MOCK_CLIENT_ID) {
        send_response(
            stream,
            401,
            "Unauthorized",
            r#"{"errorMessage": "Client is not authorized", "errorCode": "client.unauthorized"}"#,
        );
        return;
    }

    let token = match form_value(body, "grant_type") {
        Some("client_credentials") => TokenResponse {
            access_token: MOCK_CLIENT_TOKEN,
            token_type: "bearer",
            expires_in: 1800,
            scope: form_value(body, "scope").unwrap_or(""),
        },
        Some("authorization_code") if form_value(body, "code") == Some(config.valid_code.as_str()) => {
            TokenResponse {
                access_token: &config.access_token,
                token_type: "bearer",
                expires_in: 7200,
                scope: "accounts:read,transactions:read",
            }
        }
        Some("authorization_code") => {
            send_response(
                stream,
                400,
                "Bad Request",
                r#"{"errorMessage": "Authorization code is invalid or expired", "errorCode": "oauth.invalid_grant"}"#,
            );
            return;
        }
        _ => {
            send_response(stream, 400, "Bad Request", r#"{"errorMessage": "Unsupported grant type"}"#);
            return;
        }
    };

    let json = serde_json::to_string(&token).unwrap();
    send_response(stream, 200, "OK", &json);
}

fn send_response(stream: &mut TcpStream, status: u16, status_text: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        status_text,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

fn generate_mock_accounts(count: usize) -> Vec<MockAccount> {
    let names = ["Demo Checking", "Demo Savings", "Demo Credit Card"];
    let currencies = ["EUR", "SEK", "GBP"];

    (0..count)
        .map(|i| MockAccount {
            id: format!("acc-{}", i + 1),
            name: names[i % names.len()].to_string(),
            balance: 1000.0 + (i as f64 * 250.5),
            currency_code: currencies[i % currencies.len()].to_string(),
        })
        .collect()
}

fn generate_mock_transactions(account_ids: &[&str], per_account: usize) -> Vec<MockTransaction> {
    let merchants = [("ICA", -45.23), ("Spotify", -9.99), ("SALARY", 3500.0), ("SL", -39.0)];
    let start = Utc.with_ymd_and_hms(2025, 1, 31, 0, 0, 0).unwrap();

    account_ids
        .iter()
        .flat_map(|account_id| {
            (0..per_account).map(move |i| {
                let (merchant, amount) = merchants[i % merchants.len()];
                MockTransaction {
                    id: format!("tx_{}_{}", account_id, i + 1),
                    account_id: account_id.to_string(),
                    date: (start - Duration::days(i as i64)).timestamp_millis(),
                    description: format!("{} #{}", merchant, i + 1),
                    amount,
                    currency_code: "EUR".to_string(),
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::tink::TinkClient;
    use crate::domain::{AuthorizationCode, Credentials};
    use crate::ports::OpenBankingApi;
    use crate::services::{ApiFlowRunner, Verdict};

    fn runner_for(server: &MockTinkServer, code: &str) -> ApiFlowRunner {
        let client = TinkClient::new_with_base_url(
            Credentials::new(MOCK_CLIENT_ID, "mock_secret"),
            &server.base_url(),
        )
        .unwrap();
        ApiFlowRunner::new(Arc::new(client), AuthorizationCode::new(code))
    }

    #[test]
    fn test_mock_server_starts() {
        let server = MockTinkServer::start(MockConfig::default()).unwrap();
        assert!(server.base_url().starts_with("http://127.0.0.1:"));
        assert!(server.requests().is_empty());
    }

    #[test]
    fn test_exchange_returns_exact_token() {
        let server = MockTinkServer::start(MockConfig {
            access_token: "abc".to_string(),
            ..Default::default()
        })
        .unwrap();
        let runner = runner_for(&server, "fresh_code");

        let outcome = runner.exchange_authorization_code(runner.code());

        assert!(outcome.success);
        assert_eq!(outcome.status, Some(200));
        let token = outcome.data.unwrap();
        assert_eq!(token.secret(), "abc");
        assert_eq!(token.scope.as_deref(), Some("accounts:read,transactions:read"));
    }

    #[test]
    fn test_expired_code_is_a_failed_outcome() {
        let server = MockTinkServer::start(MockConfig::default()).unwrap();
        let runner = runner_for(&server, "expired_code");

        let outcome = runner.exchange_authorization_code(runner.code());

        assert!(!outcome.success);
        assert_eq!(outcome.status, Some(400));
        assert!(outcome.data.is_none());
        assert!(outcome.diagnostic.unwrap().contains("oauth.invalid_grant"));
    }

    #[test]
    fn test_client_credentials_grant() {
        let server = MockTinkServer::start(MockConfig::default()).unwrap();
        let runner = runner_for(&server, "fresh_code");

        let outcome = runner.obtain_client_token();

        assert!(outcome.success);
        assert_eq!(outcome.data.unwrap().secret(), MOCK_CLIENT_TOKEN);
        assert_eq!(server.requests(), vec!["POST /api/v1/oauth/token"]);
    }

    #[test]
    fn test_wrong_client_is_rejected() {
        let server = MockTinkServer::start(MockConfig::default()).unwrap();
        let client = TinkClient::new_with_base_url(
            Credentials::new("someone_else", "secret"),
            &server.base_url(),
        )
        .unwrap();

        let result = client.client_credentials_token();
        assert!(matches!(
            result,
            Err(crate::domain::result::Error::Http { status: 401, .. })
        ));
    }

    #[test]
    fn test_accounts_keep_response_order() {
        let server = MockTinkServer::start(MockConfig {
            num_accounts: 3,
            ..Default::default()
        })
        .unwrap();
        let runner = runner_for(&server, "fresh_code");
        let token = runner.exchange_authorization_code(runner.code()).data.unwrap();

        let accounts = runner.fetch_accounts(&token);

        assert!(accounts.success);
        let ids: Vec<&str> = accounts.items().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["acc-1", "acc-2", "acc-3"]);
        assert_eq!(accounts.items()[1].currency_code.as_deref(), Some("SEK"));
    }

    #[test]
    fn test_transactions_request_carries_account_filter() {
        let server = MockTinkServer::start(MockConfig::default()).unwrap();
        let runner = runner_for(&server, "fresh_code");
        let token = runner.exchange_authorization_code(runner.code()).data.unwrap();

        let ids = vec!["a1".to_string(), "a2".to_string()];
        let outcome = runner.fetch_transactions(&token, Some(ids.as_slice()));

        assert!(outcome.success);
        assert_eq!(outcome.items().len(), 8);
        assert!(server
            .requests()
            .contains(&"GET /api/v1/transactions/list?accountIdIn=a1&accountIdIn=a2".to_string()));
        assert_eq!(
            outcome.request.as_deref(),
            Some(format!(
                "{}/api/v1/transactions/list?accountIdIn=a1&accountIdIn=a2",
                server.base_url()
            ))
            .as_deref()
        );
    }

    #[test]
    fn test_transactions_error_body_is_parsed() {
        let server = MockTinkServer::start(MockConfig {
            transactions_error: Some((
                400,
                r#"{"errorMessage": "Invalid accountIdIn", "errorCode": "request.invalid"}"#
                    .to_string(),
            )),
            ..Default::default()
        })
        .unwrap();
        let runner = runner_for(&server, "fresh_code");
        let token = runner.exchange_authorization_code(runner.code()).data.unwrap();

        let outcome = runner.fetch_transactions(&token, Some(&["acc-1".to_string()][..]));

        assert!(!outcome.success);
        assert!(outcome.items().is_empty());
        assert_eq!(outcome.status, Some(400));
        assert_eq!(outcome.error_details.unwrap()["errorCode"], "request.invalid");
    }

    #[test]
    fn test_transactions_error_body_not_json() {
        let server = MockTinkServer::start(MockConfig {
            transactions_error: Some((503, "Service Unavailable".to_string())),
            ..Default::default()
        })
        .unwrap();
        let runner = runner_for(&server, "fresh_code");
        let token = runner.exchange_authorization_code(runner.code()).data.unwrap();

        let outcome = runner.fetch_transactions(&token, None);

        assert!(!outcome.success);
        assert_eq!(outcome.diagnostic.as_deref(), Some("Service Unavailable"));
        assert!(outcome.error_details.is_none());
    }

    #[test]
    fn test_undecodable_accounts_body_keeps_status_and_body() {
        let server = MockTinkServer::start(MockConfig {
            accounts_body: Some("<html>sandbox maintenance</html>".to_string()),
            ..Default::default()
        })
        .unwrap();
        let runner = runner_for(&server, "fresh_code");
        let token = runner.exchange_authorization_code(runner.code()).data.unwrap();

        let accounts = runner.fetch_accounts(&token);

        assert!(!accounts.success);
        assert_eq!(accounts.status, Some(200));
        assert_eq!(
            accounts.diagnostic.as_deref(),
            Some("<html>sandbox maintenance</html>")
        );

        let lines = crate::services::report::accounts_lines(&accounts);
        assert_eq!(lines[0].text, "Accounts response: 200");
        assert_eq!(lines[1].text, "Error: <html>sandbox maintenance</html>");
    }

    #[test]
    fn test_accounts_with_wrong_shape_is_a_decode_failure() {
        let server = MockTinkServer::start(MockConfig {
            accounts_body: Some(r#"{"accounts": "none"}"#.to_string()),
            ..Default::default()
        })
        .unwrap();
        let report = runner_for(&server, "fresh_code").run_diagnostic();

        assert_eq!(report.verdict, Verdict::NoAccounts);
        let failed = report.failed_steps();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].1, Some(200));
        assert_eq!(failed[0].2, r#"{"accounts": "none"}"#);
    }

    #[test]
    fn test_run_diagnostic_finds_transactions() {
        let server = MockTinkServer::start(MockConfig::default()).unwrap();
        let report = runner_for(&server, "fresh_code").run_diagnostic();

        assert_eq!(report.verdict, Verdict::TransactionsFound { count: 8 });
        assert_eq!(
            server.requests(),
            vec![
                "POST /api/v1/oauth/token",
                "GET /api/v1/accounts/list",
                "GET /api/v1/transactions/list?accountIdIn=acc-1&accountIdIn=acc-2",
            ]
        );
    }

    #[test]
    fn test_run_diagnostic_sandbox_without_transactions() {
        let server = MockTinkServer::start(MockConfig {
            num_transactions_per_account: 0,
            ..Default::default()
        })
        .unwrap();
        let report = runner_for(&server, "fresh_code").run_diagnostic();

        assert_eq!(report.verdict, Verdict::NoTransactions);
        assert!(report.transactions.unwrap().success);
    }

    #[test]
    fn test_run_diagnostic_expired_code_stops_early() {
        let server = MockTinkServer::start(MockConfig::default()).unwrap();
        let report = runner_for(&server, "expired_code").run_diagnostic();

        assert_eq!(report.verdict, Verdict::NoToken);
        assert!(report.accounts.is_none());
        assert_eq!(server.requests(), vec!["POST /api/v1/oauth/token"]);
    }

    #[test]
    fn test_run_diagnostic_without_accounts() {
        let server = MockTinkServer::start(MockConfig {
            num_accounts: 0,
            ..Default::default()
        })
        .unwrap();
        let report = runner_for(&server, "fresh_code").run_diagnostic();

        assert_eq!(report.verdict, Verdict::NoAccounts);
        assert!(report.accounts.as_ref().unwrap().success);
        assert!(report.transactions.is_none());
        assert!(!server
            .requests()
            .iter()
            .any(|r| r.contains("/transactions/list")));
    }

    #[test]
    fn test_run_diagnostic_accounts_failure() {
        let server = MockTinkServer::start(MockConfig {
            fail_accounts: true,
            ..Default::default()
        })
        .unwrap();
        let report = runner_for(&server, "fresh_code").run_diagnostic();

        assert_eq!(report.verdict, Verdict::NoAccounts);
        let failed = report.failed_steps();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].1, Some(401));
    }
}
