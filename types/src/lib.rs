//! Fundamental types for the Splitline wallet.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! 32-byte identifiers and digests, key material, timestamps and the clock capability.

pub mod error;
pub mod hash;
pub mod keys;
pub mod time;

pub use error::TypesError;
pub use hash::{CoinId, DataHash, RequestId, Salt, TokenId, TokenType, TransactionHash};
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use time::{Clock, SystemClock, Timestamp};
