//! The ledger client seam.

use async_trait::async_trait;
use splitline_transactions::{InclusionProof, MintCommitment, TransferCommitment};
use splitline_types::RequestId;
use std::time::Duration;

use crate::error::LedgerError;
use crate::status::SubmitStatus;

/// Access to the ledger that orders commitments.
///
/// Implementations are shared across tasks behind an `Arc`.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn submit_mint(&self, commitment: &MintCommitment) -> Result<SubmitStatus, LedgerError>;

    async fn submit_transfer(
        &self,
        commitment: &TransferCommitment,
    ) -> Result<SubmitStatus, LedgerError>;

    /// The proof for `request_id`, or `None` if it has not been ordered yet.
    async fn get_inclusion_proof(
        &self,
        request_id: &RequestId,
    ) -> Result<Option<InclusionProof>, LedgerError>;

    /// Poll until a proof for `request_id` exists.
    ///
    /// Unbounded; callers impose their own timeout. Transient errors are
    /// retried on the next poll.
    async fn await_inclusion_proof(
        &self,
        request_id: &RequestId,
        poll_interval: Duration,
    ) -> Result<InclusionProof, LedgerError> {
        loop {
            match self.get_inclusion_proof(request_id).await {
                Ok(Some(proof)) => return Ok(proof),
                Ok(None) => {}
                Err(e) if e.is_transient() => {
                    tracing::debug!(request_id = %request_id, error = %e, "transient error polling for proof");
                }
                Err(e) => return Err(e),
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}
