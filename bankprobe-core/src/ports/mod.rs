//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The flow runner
//! depends only on these traits, not on concrete implementations.

mod open_banking;

pub use open_banking::{ApiReply, OpenBankingApi, CLIENT_CREDENTIALS_SCOPES};
