//! Token-specific errors.

use splitline_transactions::TransactionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("transfer is for token {got}, expected {expected}")]
    TokenIdMismatch { expected: String, got: String },

    #[error("transfer does not spend the token's current state")]
    SourceStateMismatch,

    #[error("state address {got} does not match recipient {expected}")]
    RecipientMismatch { expected: String, got: String },

    #[error("token is burned")]
    Burned,

    #[error("no nametag token for proxy address {0}")]
    MissingNametag(String),

    #[error("nametag {0} is not held by the final state's owner")]
    NametagNotOwned(String),

    #[error("mint to a proxy address is not supported: {0}")]
    ProxyMint(String),

    #[error(transparent)]
    Transaction(#[from] TransactionError),
}
