//! Tokens: the value a wallet holds.
//!
//! A token is rooted in a proven mint and carries every proven transfer
//! since. Its current ownership is its active [`TokenState`]; earlier
//! states stay inside the transaction history.
//!
//! [`TokenState`]: splitline_transactions::TokenState

pub mod error;
pub mod token;

pub use error::TokenError;
pub use token::{NametagCheck, Token};
