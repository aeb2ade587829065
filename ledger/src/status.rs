//! Submission status codes.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Ledger answer to a commitment submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitStatus {
    Success,
    /// A commitment with this request id was already ordered. Resubmitting
    /// an accepted commitment lands here, so it counts as accepted.
    RequestIdExists,
    AuthenticatorVerificationFailed,
    RequestIdMismatch,
    TransactionHashMismatch,
    Other(String),
}

impl SubmitStatus {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Success | Self::RequestIdExists)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Success => "SUCCESS",
            Self::RequestIdExists => "REQUEST_ID_EXISTS",
            Self::AuthenticatorVerificationFailed => "AUTHENTICATOR_VERIFICATION_FAILED",
            Self::RequestIdMismatch => "REQUEST_ID_MISMATCH",
            Self::TransactionHashMismatch => "TRANSACTION_HASH_MISMATCH",
            Self::Other(s) => s,
        }
    }

    pub fn from_wire(s: &str) -> Self {
        match s {
            "SUCCESS" => Self::Success,
            "REQUEST_ID_EXISTS" => Self::RequestIdExists,
            "AUTHENTICATOR_VERIFICATION_FAILED" => Self::AuthenticatorVerificationFailed,
            "REQUEST_ID_MISMATCH" => Self::RequestIdMismatch,
            "TRANSACTION_HASH_MISMATCH" => Self::TransactionHashMismatch,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for SubmitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SubmitStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SubmitStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from_wire(&s))
    }
}
