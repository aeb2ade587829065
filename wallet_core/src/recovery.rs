//! Repair of splits whose background phase never finished.
//!
//! The host feeds back its persisted outbox. For every split that was
//! delivered but not reconciled, the change token is rebuilt from the
//! persisted sender mint commitment and the recipient's commitments are
//! resubmitted from the stored bundle. Entries are processed one at a time
//! and a failing entry never stops the rest.

use serde::Serialize;
use splitline_token::Token;
use splitline_transactions::{Predicate, TokenState, Transaction};
use splitline_types::Timestamp;
use tracing::{debug, info, warn, Instrument};

use crate::bundle::{SplitBundle, VERSION_V5};
use crate::context::SplitContext;
use crate::error::{SplitError, SplitStage, SplitWarning};
use crate::reconciler::{build_change_token, hand_over_change_token};
use crate::records::{OutboxRecord, OutboxStatus, RecoveryMetadata, RecoveryStatus, SplitGroupId};
use crate::tracing_spans::split_recovery_span;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryErrorEntry {
    pub split_group_id: SplitGroupId,
    pub error: String,
    pub timestamp: Timestamp,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryReport {
    /// Candidates brought to `Completed` by this run.
    pub splits_recovered: usize,
    /// Change tokens rebuilt and handed to the host.
    pub change_tokens_recovered: usize,
    /// Recipient mint and transfer commitments the ledger accepted again.
    pub recipient_commitments_resubmitted: usize,
    /// Candidates whose change token the host already held.
    pub already_complete: usize,
    /// Records that were not candidates.
    pub skipped: usize,
    pub errors: Vec<RecoveryErrorEntry>,
    #[serde(skip)]
    pub warnings: Vec<SplitWarning>,
}

enum EntryOutcome {
    Recovered,
    AlreadyComplete,
}

pub struct RecoveryService {
    ctx: SplitContext,
}

impl RecoveryService {
    pub fn new(ctx: SplitContext) -> Self {
        Self { ctx }
    }

    /// Metadata of `record` if it is a split worth recovering: production
    /// version, not yet completed, and either sent or burned with its
    /// bundle persisted but never delivered.
    pub fn candidate(record: &OutboxRecord) -> Option<&RecoveryMetadata> {
        let metadata = record.metadata.as_ref()?;
        if record.status != OutboxStatus::Sent && metadata.status != RecoveryStatus::BundleReady {
            return None;
        }
        (metadata.split_group_id == record.split_group_id
            && metadata.version == VERSION_V5
            && metadata.status != RecoveryStatus::Completed)
            .then_some(metadata)
    }

    pub async fn recover(&self, records: &[OutboxRecord]) -> RecoveryReport {
        let candidates: Vec<_> = records
            .iter()
            .filter_map(|r| Self::candidate(r).map(|m| (r, m)))
            .collect();
        let mut report = RecoveryReport {
            skipped: records.len() - candidates.len(),
            ..RecoveryReport::default()
        };
        let span = split_recovery_span(candidates.len());
        async {
            for (record, metadata) in candidates {
                let sgid = metadata.split_group_id;
                match self.recover_entry(record, metadata, &mut report).await {
                    Ok(EntryOutcome::Recovered) => {
                        report.splits_recovered += 1;
                        report.change_tokens_recovered += 1;
                    }
                    Ok(EntryOutcome::AlreadyComplete) => report.already_complete += 1,
                    Err(e) => {
                        warn!(split_group_id = %sgid, error = %e, "split recovery failed");
                        report.errors.push(RecoveryErrorEntry {
                            split_group_id: sgid,
                            error: e.to_string(),
                            timestamp: self.ctx.clock.now(),
                        });
                    }
                }
            }
            info!(
                recovered = report.splits_recovered,
                already_complete = report.already_complete,
                failed = report.errors.len(),
                "recovery pass finished"
            );
        }
        .instrument(span)
        .await;
        report
    }

    async fn recover_entry(
        &self,
        record: &OutboxRecord,
        metadata: &RecoveryMetadata,
        report: &mut RecoveryReport,
    ) -> Result<EntryOutcome, SplitError> {
        let change_state = self.check_metadata(metadata)?;
        let sender_token_id = metadata.sender_token_id;

        let held = match self.ctx.callbacks.has_token(&sender_token_id).await {
            Ok(held) => held,
            Err(e) => {
                report
                    .warnings
                    .push(SplitWarning::new(SplitStage::Recovery, e.to_string()));
                false
            }
        };
        if held {
            debug!(split_group_id = %metadata.split_group_id, "change token already present");
            self.mark_completed(metadata, &mut report.warnings).await;
            return Ok(EntryOutcome::AlreadyComplete);
        }

        if let Some(bundle_json) = metadata.bundle_json.as_ref().or(record.bundle_json.as_ref()) {
            self.resubmit_recipient(bundle_json, report).await;
        }

        let commitment = &metadata.sender_mint_commitment;
        let status = self.ctx.ledger.submit_mint(commitment).await?;
        if !status.is_accepted() {
            return Err(SplitError::rejected(SplitStage::SenderMint, status));
        }
        let proof = self
            .ctx
            .proof_waiter()
            .wait(
                SplitStage::SenderMintProof,
                commitment.request_id,
                commitment.transaction_hash(),
            )
            .await?;
        let token = build_change_token(
            &self.ctx,
            Transaction::from_commitment(commitment, proof)?,
            change_state,
        )?;
        if !hand_over_change_token(&self.ctx, &token, &mut report.warnings).await {
            return Err(SplitError::VerificationFailed(format!(
                "host did not accept recovered change token {}",
                token.id()
            )));
        }
        self.mark_completed(metadata, &mut report.warnings).await;
        info!(split_group_id = %metadata.split_group_id, token_id = %token.id(), "change token recovered");
        Ok(EntryOutcome::Recovered)
    }

    /// Re-derive the plan from the seed and check the persisted commitment
    /// against it. Returns the state the change token is minted to.
    fn check_metadata(&self, metadata: &RecoveryMetadata) -> Result<TokenState, SplitError> {
        let plan = self.ctx.planner().derive(
            metadata.original_token_id,
            metadata.coin_id,
            metadata.split_amount,
            metadata.change_amount,
            &metadata.seed_string,
        );
        let mismatch = |what: &str| {
            Err(SplitError::VerificationFailed(format!(
                "recovery metadata {what} does not match seed"
            )))
        };
        if plan.sender_token_id != metadata.sender_token_id {
            return mismatch("sender token id");
        }
        if plan.sender_salt != metadata.sender_salt {
            return mismatch("sender salt");
        }

        let commitment = &metadata.sender_mint_commitment;
        commitment.verify()?;
        let data = &commitment.transaction_data;
        if data.token_id != plan.sender_token_id || data.salt != plan.sender_salt {
            return mismatch("sender mint commitment");
        }
        if data.coins != metadata.change_coins
            || data.coins.amount_of(&metadata.coin_id) != metadata.change_amount
        {
            return mismatch("change amount");
        }

        let change_state = TokenState::new(Predicate::masked(
            self.ctx.identity.public_key().clone(),
            plan.sender_token_id,
            metadata.token_type,
            plan.sender_salt,
        ));
        if change_state.address() != data.recipient {
            return Err(SplitError::NotOwner);
        }
        Ok(change_state)
    }

    /// Resubmit the recipient mint and transfer from the delivered bundle so
    /// an offline recipient can still finish later. Best effort.
    async fn resubmit_recipient(&self, bundle_json: &str, report: &mut RecoveryReport) {
        let bundle = match SplitBundle::from_json(bundle_json) {
            Ok(bundle) => bundle,
            Err(e) => {
                report
                    .warnings
                    .push(SplitWarning::new(SplitStage::Recovery, e.to_string()));
                return;
            }
        };
        let body = bundle.body();
        let mint = splitline_transactions::MintCommitment::create(body.recipient_mint_data.clone());
        let results = [
            (SplitStage::RecipientMint, self.ctx.ledger.submit_mint(&mint).await),
            (
                SplitStage::Transfer,
                self.ctx
                    .ledger
                    .submit_transfer(&body.transfer_commitment)
                    .await,
            ),
        ];
        for (stage, result) in results {
            match result {
                Ok(status) if status.is_accepted() => report.recipient_commitments_resubmitted += 1,
                Ok(status) => report
                    .warnings
                    .push(SplitWarning::new(stage, format!("ledger answered {status}"))),
                Err(e) => report.warnings.push(SplitWarning::new(stage, e.to_string())),
            }
        }
    }

    async fn mark_completed(&self, metadata: &RecoveryMetadata, warnings: &mut Vec<SplitWarning>) {
        let updated = metadata.with_status(RecoveryStatus::Completed, self.ctx.clock.now());
        if let Err(e) = self.ctx.callbacks.persist_recovery_metadata(&updated).await {
            warnings.push(SplitWarning::new(SplitStage::Persistence, e.to_string()));
        }
    }

    /// Whether `token` is backed by the ledger: its history verifies against
    /// the trust base and the ledger still serves the proof of its latest
    /// transaction. Always true in dev mode.
    pub async fn verify_token_exists(&self, token: &Token) -> Result<bool, SplitError> {
        if self.ctx.dev_mode() {
            return Ok(true);
        }
        if let Err(e) = token.verify(&self.ctx.trust_base) {
            debug!(token_id = %token.id(), error = %e, "token does not verify");
            return Ok(false);
        }
        let (request_id, tx_hash) = match token.transactions.last() {
            Some(tx) => (tx.request_id(), tx.hash()),
            None => (token.genesis.request_id(), token.genesis.hash()),
        };
        let Some(proof) = self.ctx.ledger.get_inclusion_proof(&request_id).await? else {
            return Ok(false);
        };
        Ok(proof.matches(&request_id, &tx_hash) && self.ctx.trust_base.verify(&proof).is_ok())
    }
}
