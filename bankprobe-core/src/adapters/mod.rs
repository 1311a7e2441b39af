//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - Tink HTTP client for OpenBankingApi
//! - Mock Tink server for tests

pub mod tink;

#[cfg(test)]
pub mod tink_mock;
