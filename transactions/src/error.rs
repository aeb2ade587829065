use splitline_types::TypesError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("invalid authenticator signature on {what}")]
    InvalidSignature { what: &'static str },

    #[error("request id mismatch: expected {expected}, got {got}")]
    RequestIdMismatch { expected: String, got: String },

    #[error("transaction hash mismatch: expected {expected}, got {got}")]
    TransactionHashMismatch { expected: String, got: String },

    #[error("source state hash mismatch: expected {expected}, got {got}")]
    StateHashMismatch { expected: String, got: String },

    #[error("signer does not own the source state")]
    NotOwner,

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid inclusion proof: {0}")]
    InvalidProof(String),

    #[error("synthetic inclusion proof cannot be verified against a trust base")]
    SyntheticProof,

    #[error("malformed burn transaction: {0}")]
    MalformedBurn(String),

    #[error("amount must be positive")]
    ZeroAmount,

    #[error(transparent)]
    Types(#[from] TypesError),

    #[error("{0}")]
    Other(String),
}
