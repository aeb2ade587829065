//! Errors raised while parsing fundamental types.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid hex for {kind}: {reason}")]
    InvalidHex { kind: &'static str, reason: String },

    #[error("invalid length for {kind}: expected {expected} bytes, got {got}")]
    InvalidLength {
        kind: &'static str,
        expected: usize,
        got: usize,
    },
}
