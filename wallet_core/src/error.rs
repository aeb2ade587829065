//! Split engine errors and warnings.

use serde::{Deserialize, Serialize};
use splitline_ledger::{LedgerError, SubmitStatus};
use splitline_token::TokenError;
use splitline_transactions::TransactionError;
use splitline_transport::TransportError;
use splitline_types::RequestId;
use std::fmt;
use thiserror::Error;

/// Protocol step an error or warning belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitStage {
    Plan,
    Burn,
    BurnProof,
    Deliver,
    RecipientMint,
    RecipientMintProof,
    Transfer,
    TransferProof,
    Nametag,
    Finalize,
    Verify,
    SenderMint,
    SenderMintProof,
    ChangeToken,
    StorageSync,
    Persistence,
    Recovery,
}

impl fmt::Display for SplitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Plan => "plan",
            Self::Burn => "burn",
            Self::BurnProof => "burn_proof",
            Self::Deliver => "deliver",
            Self::RecipientMint => "recipient_mint",
            Self::RecipientMintProof => "recipient_mint_proof",
            Self::Transfer => "transfer",
            Self::TransferProof => "transfer_proof",
            Self::Nametag => "nametag",
            Self::Finalize => "finalize",
            Self::Verify => "verify",
            Self::SenderMint => "sender_mint",
            Self::SenderMintProof => "sender_mint_proof",
            Self::ChangeToken => "change_token",
            Self::StorageSync => "storage_sync",
            Self::Persistence => "persistence",
            Self::Recovery => "recovery",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum SplitError {
    #[error("{stage} submission rejected by ledger: {status}")]
    SubmissionRejected {
        stage: SplitStage,
        status: SubmitStatus,
    },

    #[error("{stage}: no inclusion proof for {request_id} after {waited_ms}ms")]
    ProofTimeout {
        stage: SplitStage,
        request_id: RequestId,
        waited_ms: u64,
    },

    #[error("verification failed: {0}")]
    VerificationFailed(String),

    #[error("policy violation: {0}")]
    PolicyViolation(String),

    #[error("invalid split amounts: {0}")]
    InvalidAmounts(String),

    #[error("invalid bundle: {0}")]
    InvalidBundle(String),

    #[error("unsupported bundle version {0:?}")]
    UnsupportedBundleVersion(String),

    #[error("{0} requires dev mode")]
    DevModeRequired(&'static str),

    #[error("token is not owned by the local signing identity")]
    NotOwner,

    #[error("background task aborted: {0}")]
    BackgroundAborted(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Transaction(#[from] TransactionError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SplitError {
    /// Proof timeouts and transient ledger/transport failures.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ProofTimeout { .. } => true,
            Self::Ledger(e) => e.is_transient(),
            Self::Transport(e) => e.is_transient(),
            _ => false,
        }
    }

    pub(crate) fn rejected(stage: SplitStage, status: SubmitStatus) -> Self {
        Self::SubmissionRejected { stage, status }
    }
}

/// A non-fatal problem reported next to a successful result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitWarning {
    pub stage: SplitStage,
    pub message: String,
}

impl SplitWarning {
    pub fn new(stage: SplitStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

impl fmt::Display for SplitWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.stage, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_timeouts_and_transient_failures_retry() {
        let timeout = SplitError::ProofTimeout {
            stage: SplitStage::BurnProof,
            request_id: RequestId::ZERO,
            waited_ms: 60_000,
        };
        assert!(timeout.is_retryable());
        assert!(SplitError::Ledger(LedgerError::Transport("reset".into())).is_retryable());
        assert!(!SplitError::Ledger(LedgerError::Http { status: 400 }).is_retryable());
        assert!(!SplitError::rejected(SplitStage::Burn, SubmitStatus::RequestIdMismatch)
            .is_retryable());
        assert!(!SplitError::PolicyViolation("no nametag".into()).is_retryable());
    }

    #[test]
    fn rejection_message_names_stage_and_status() {
        let err = SplitError::rejected(
            SplitStage::Burn,
            SubmitStatus::AuthenticatorVerificationFailed,
        );
        assert_eq!(
            err.to_string(),
            "burn submission rejected by ledger: AUTHENTICATOR_VERIFICATION_FAILED"
        );
    }
}
