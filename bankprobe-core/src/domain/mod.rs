//! Core domain entities
//!
//! Plain data carried between the API adapter, the flow runner and the
//! report. Nothing here performs I/O.

mod account;
mod credentials;
mod token;
mod transaction;
pub mod result;

pub use account::{account_ids, Account};
pub use credentials::{AuthorizationCode, Credentials};
pub use token::AccessToken;
pub use transaction::Transaction;
