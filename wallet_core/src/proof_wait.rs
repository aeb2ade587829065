//! Bounded inclusion-proof waits shared by every role.

use splitline_ledger::LedgerClient;
use splitline_transactions::InclusionProof;
use splitline_types::{RequestId, TransactionHash};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn, Instrument};

use crate::error::{SplitError, SplitStage};
use crate::tracing_spans::proof_wait_span;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProofWaitPolicy {
    /// Wait up to `timeout`, then fail with a proof timeout.
    Strict { timeout: Duration },
    /// Dev mode: after `fallback_after` give up and substitute a synthetic
    /// proof. Never constructed from a production config.
    Dev {
        timeout: Duration,
        fallback_after: Duration,
    },
}

impl ProofWaitPolicy {
    pub fn timeout(&self) -> Duration {
        match self {
            Self::Strict { timeout } | Self::Dev { timeout, .. } => *timeout,
        }
    }
}

#[derive(Clone)]
pub struct ProofWaiter {
    ledger: Arc<dyn LedgerClient>,
    policy: ProofWaitPolicy,
    poll_interval: Duration,
}

impl ProofWaiter {
    pub fn new(ledger: Arc<dyn LedgerClient>, policy: ProofWaitPolicy, poll_interval: Duration) -> Self {
        Self {
            ledger,
            policy,
            poll_interval,
        }
    }

    pub fn policy(&self) -> ProofWaitPolicy {
        self.policy
    }

    /// Wait for the proof of `request_id` and check that it commits to
    /// `transaction_hash`.
    ///
    /// A proof for the same request id but another transaction means a
    /// competing commitment (e.g. a second burn of the same state) was
    /// ordered instead of ours; that is a verification failure.
    pub async fn wait(
        &self,
        stage: SplitStage,
        request_id: RequestId,
        transaction_hash: TransactionHash,
    ) -> Result<InclusionProof, SplitError> {
        let span = proof_wait_span(&stage.to_string(), &request_id.to_hex());
        async move {
            let start = Instant::now();
            let proof = match self.policy {
                ProofWaitPolicy::Strict { timeout } => {
                    self.wait_bounded(stage, request_id, timeout, start).await?
                }
                ProofWaitPolicy::Dev {
                    timeout,
                    fallback_after,
                } => {
                    tokio::select! {
                        result = self.wait_bounded(stage, request_id, timeout, start) => result?,
                        _ = tokio::time::sleep(fallback_after) => {
                            warn!(
                                stage = %stage,
                                request_id = %request_id,
                                waited_ms = millis(start),
                                "dev mode: substituting synthetic inclusion proof"
                            );
                            InclusionProof::synthetic(request_id, transaction_hash)
                        }
                    }
                }
            };
            if !proof.matches(&request_id, &transaction_hash) {
                return Err(SplitError::VerificationFailed(format!(
                    "{stage}: proof for request {request_id} commits to transaction {}, expected {transaction_hash}",
                    proof.transaction_hash
                )));
            }
            debug!(stage = %stage, round = proof.round, elapsed_ms = millis(start), "inclusion proof received");
            Ok(proof)
        }
        .instrument(span)
        .await
    }

    async fn wait_bounded(
        &self,
        stage: SplitStage,
        request_id: RequestId,
        timeout: Duration,
        start: Instant,
    ) -> Result<InclusionProof, SplitError> {
        match tokio::time::timeout(
            timeout,
            self.ledger.await_inclusion_proof(&request_id, self.poll_interval),
        )
        .await
        {
            Ok(result) => Ok(result?),
            Err(_) => Err(SplitError::ProofTimeout {
                stage,
                request_id,
                waited_ms: millis(start),
            }),
        }
    }
}

fn millis(start: Instant) -> u64 {
    splitline_utils::elapsed_ms(start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use splitline_nullables::NullLedger;
    use splitline_transactions::{
        Address, CoinData, MintCommitment, MintReason, MintTransactionData,
    };
    use splitline_types::{CoinId, DataHash, Salt, TokenId, TokenType};

    fn commitment() -> MintCommitment {
        MintCommitment::create(MintTransactionData {
            token_id: TokenId::new([1; 32]),
            token_type: TokenType::new([2; 32]),
            coins: CoinData::single(CoinId::ZERO, 5),
            recipient: Address::Direct(DataHash::new([3; 32])),
            salt: Salt::new([4; 32]),
            reason: MintReason::Genesis,
        })
    }

    fn waiter(ledger: Arc<NullLedger>, policy: ProofWaitPolicy) -> ProofWaiter {
        ProofWaiter::new(ledger, policy, Duration::from_millis(10))
    }

    #[tokio::test]
    async fn returns_ledger_proof() {
        let ledger = Arc::new(NullLedger::new());
        let c = commitment();
        ledger.submit_mint(&c).await.unwrap();
        let policy = ProofWaitPolicy::Strict {
            timeout: Duration::from_secs(1),
        };
        let proof = waiter(ledger, policy)
            .wait(SplitStage::SenderMintProof, c.request_id, c.transaction_hash())
            .await
            .unwrap();
        assert!(!proof.is_synthetic());
    }

    #[tokio::test(start_paused = true)]
    async fn strict_policy_times_out() {
        let ledger = Arc::new(NullLedger::new());
        let c = commitment();
        let policy = ProofWaitPolicy::Strict {
            timeout: Duration::from_secs(60),
        };
        let err = waiter(ledger, policy)
            .wait(SplitStage::BurnProof, c.request_id, c.transaction_hash())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SplitError::ProofTimeout { stage: SplitStage::BurnProof, .. }
        ));
        assert!(err.is_retryable());
    }

    #[tokio::test(start_paused = true)]
    async fn dev_policy_falls_back_to_synthetic() {
        let ledger = Arc::new(NullLedger::new());
        let c = commitment();
        let policy = ProofWaitPolicy::Dev {
            timeout: Duration::from_secs(60),
            fallback_after: Duration::from_secs(5),
        };
        let proof = waiter(ledger, policy)
            .wait(SplitStage::TransferProof, c.request_id, c.transaction_hash())
            .await
            .unwrap();
        assert!(proof.is_synthetic());
    }

    #[tokio::test]
    async fn proof_for_other_transaction_is_a_verification_failure() {
        let ledger = Arc::new(NullLedger::new());
        let c = commitment();
        ledger.submit_mint(&c).await.unwrap();
        let policy = ProofWaitPolicy::Strict {
            timeout: Duration::from_secs(1),
        };
        let err = waiter(ledger, policy)
            .wait(
                SplitStage::BurnProof,
                c.request_id,
                splitline_types::TransactionHash::new([0xee; 32]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SplitError::VerificationFailed(_)));
    }
}
