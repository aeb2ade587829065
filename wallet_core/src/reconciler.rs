//! Background reconciliation of a delivered split.
//!
//! After the bundle is out, the sender still has to get both mints and the
//! transfer ordered and rebuild its change token. None of that blocks the
//! caller: it runs as a detached task observed through [`BackgroundTask`].

use futures_util::future::join3;
use serde::{Deserialize, Serialize};
use splitline_ledger::{LedgerError, SubmitStatus};
use splitline_token::Token;
use splitline_transactions::{MintCommitment, TokenState, Transaction, TransferCommitment};
use std::time::Instant;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn, Instrument};

use crate::context::SplitContext;
use crate::error::{SplitError, SplitStage, SplitWarning};
use crate::records::{RecoveryMetadata, RecoveryStatus, SplitGroupId};
use crate::tracing_spans::split_background_span;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BackgroundStage {
    Started,
    MintsSubmitted,
    MintsProven,
    ChangeTokenSaved,
    StorageSynced,
    Completed,
    Failed,
}

impl BackgroundStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// The deferred half of one split.
#[derive(Clone, Debug)]
pub struct BackgroundJob {
    pub split_group_id: SplitGroupId,
    pub sender_mint: MintCommitment,
    pub recipient_mint: MintCommitment,
    pub transfer: TransferCommitment,
    /// State the change piece is minted to.
    pub change_state: TokenState,
    pub metadata: Option<RecoveryMetadata>,
}

/// Per-commitment result of the concurrent submission fan-out.
#[derive(Debug)]
pub struct SubmissionReport {
    pub sender_mint: Result<SubmitStatus, LedgerError>,
    pub recipient_mint: Result<SubmitStatus, LedgerError>,
    pub transfer: Result<SubmitStatus, LedgerError>,
}

#[derive(Debug)]
pub struct BackgroundOutcome {
    pub split_group_id: SplitGroupId,
    /// `Completed` or `Failed`.
    pub stage: BackgroundStage,
    pub change_token: Option<Token>,
    pub error: Option<SplitError>,
    pub warnings: Vec<SplitWarning>,
    pub submissions: Option<SubmissionReport>,
    pub elapsed_ms: u64,
}

impl BackgroundOutcome {
    pub fn is_success(&self) -> bool {
        self.stage == BackgroundStage::Completed
    }
}

/// Handle to a running background reconciliation.
///
/// Await it with [`join`](Self::join), watch [`stage`](Self::stage), or drop
/// it; dropping does not cancel the task.
#[derive(Debug)]
pub struct BackgroundTask {
    split_group_id: SplitGroupId,
    handle: JoinHandle<BackgroundOutcome>,
    stage: watch::Receiver<BackgroundStage>,
}

impl BackgroundTask {
    pub fn split_group_id(&self) -> SplitGroupId {
        self.split_group_id
    }

    /// Latest stage reached.
    pub fn stage(&self) -> BackgroundStage {
        *self.stage.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<BackgroundStage> {
        self.stage.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub async fn join(self) -> BackgroundOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => BackgroundOutcome {
                split_group_id: self.split_group_id,
                stage: BackgroundStage::Failed,
                change_token: None,
                error: Some(SplitError::BackgroundAborted(e.to_string())),
                warnings: Vec::new(),
                submissions: None,
                elapsed_ms: 0,
            },
        }
    }
}

#[derive(Clone)]
pub struct BackgroundReconciler {
    ctx: SplitContext,
}

impl BackgroundReconciler {
    pub fn new(ctx: SplitContext) -> Self {
        Self { ctx }
    }

    /// Run `job` on the tokio runtime and return its handle immediately.
    pub fn spawn(self, job: BackgroundJob) -> BackgroundTask {
        let split_group_id = job.split_group_id;
        let (tx, rx) = watch::channel(BackgroundStage::Started);
        let span = split_background_span(&split_group_id);
        let handle = tokio::spawn(async move { self.run(job, tx).await }.instrument(span));
        BackgroundTask {
            split_group_id,
            handle,
            stage: rx,
        }
    }

    pub async fn run(
        &self,
        job: BackgroundJob,
        progress: watch::Sender<BackgroundStage>,
    ) -> BackgroundOutcome {
        let start = Instant::now();
        let sgid = job.split_group_id;
        let mut warnings = Vec::new();
        let ledger = &self.ctx.ledger;

        let (sender_mint, recipient_mint, transfer) = join3(
            ledger.submit_mint(&job.sender_mint),
            ledger.submit_mint(&job.recipient_mint),
            ledger.submit_transfer(&job.transfer),
        )
        .await;
        let report = SubmissionReport {
            sender_mint,
            recipient_mint,
            transfer,
        };
        for (stage, result) in [
            (SplitStage::RecipientMint, &report.recipient_mint),
            (SplitStage::Transfer, &report.transfer),
        ] {
            match result {
                Ok(status) if status.is_accepted() => {}
                Ok(status) => warnings.push(SplitWarning::new(stage, format!("ledger answered {status}"))),
                Err(e) => warnings.push(SplitWarning::new(stage, e.to_string())),
            }
        }
        info!(
            split_group_id = %sgid,
            sender_mint = ?report.sender_mint.as_ref().map(SubmitStatus::as_str),
            recipient_mint = ?report.recipient_mint.as_ref().map(SubmitStatus::as_str),
            transfer = ?report.transfer.as_ref().map(SubmitStatus::as_str),
            "background submissions finished"
        );
        self.emit(&sgid, &progress, BackgroundStage::MintsSubmitted).await;

        let sender_result = match &report.sender_mint {
            Ok(status) if status.is_accepted() => Ok(()),
            Ok(status) => Err(SplitError::rejected(SplitStage::SenderMint, status.clone())),
            Err(e) => Err(SplitError::Ledger(e.clone())),
        };
        let token = match sender_result {
            Ok(()) => self.prove_change_token(&job, &progress).await,
            Err(e) => Err(e),
        };

        let token = match token {
            Ok(token) => token,
            Err(e) => {
                error!(split_group_id = %sgid, error = %e, "background reconciliation failed");
                self.persist(&job, RecoveryStatus::Failed, &mut warnings).await;
                self.emit(&sgid, &progress, BackgroundStage::Failed).await;
                return BackgroundOutcome {
                    split_group_id: sgid,
                    stage: BackgroundStage::Failed,
                    change_token: None,
                    error: Some(e),
                    warnings,
                    submissions: Some(report),
                    elapsed_ms: splitline_utils::elapsed_ms(start),
                };
            }
        };

        if hand_over_change_token(&self.ctx, &token, &mut warnings).await {
            self.emit(&sgid, &progress, BackgroundStage::ChangeTokenSaved).await;
        }
        match self.ctx.callbacks.on_storage_sync().await {
            Ok(true) => self.emit(&sgid, &progress, BackgroundStage::StorageSynced).await,
            Ok(false) => {}
            Err(e) => {
                warn!(split_group_id = %sgid, error = %e, "storage sync failed");
                warnings.push(SplitWarning::new(SplitStage::StorageSync, e.to_string()));
            }
        }
        self.persist(&job, RecoveryStatus::Completed, &mut warnings).await;
        self.emit(&sgid, &progress, BackgroundStage::Completed).await;

        let elapsed_ms = splitline_utils::elapsed_ms(start);
        info!(split_group_id = %sgid, elapsed_ms, warnings = warnings.len(), "background reconciliation completed");
        BackgroundOutcome {
            split_group_id: sgid,
            stage: BackgroundStage::Completed,
            change_token: Some(token),
            error: None,
            warnings,
            submissions: Some(report),
            elapsed_ms,
        }
    }

    async fn prove_change_token(
        &self,
        job: &BackgroundJob,
        progress: &watch::Sender<BackgroundStage>,
    ) -> Result<Token, SplitError> {
        let commitment = &job.sender_mint;
        let proof = self
            .ctx
            .proof_waiter()
            .wait(
                SplitStage::SenderMintProof,
                commitment.request_id,
                commitment.transaction_hash(),
            )
            .await?;
        self.emit(&job.split_group_id, progress, BackgroundStage::MintsProven)
            .await;
        let tx = Transaction::from_commitment(commitment, proof)?;
        build_change_token(&self.ctx, tx, job.change_state.clone())
    }

    async fn emit(
        &self,
        sgid: &SplitGroupId,
        progress: &watch::Sender<BackgroundStage>,
        stage: BackgroundStage,
    ) {
        progress.send_replace(stage);
        self.ctx.callbacks.on_background_progress(sgid, stage).await;
    }

    async fn persist(
        &self,
        job: &BackgroundJob,
        status: RecoveryStatus,
        warnings: &mut Vec<SplitWarning>,
    ) {
        if let Some(metadata) = &job.metadata {
            let updated = metadata.with_status(status, self.ctx.clock.now());
            if let Err(e) = self.ctx.callbacks.persist_recovery_metadata(&updated).await {
                warn!(split_group_id = %job.split_group_id, error = %e, "failed to persist recovery metadata");
                warnings.push(SplitWarning::new(SplitStage::Persistence, e.to_string()));
            }
        }
    }
}

/// Change token from its proven mint; verified unless in dev mode.
pub(crate) fn build_change_token(
    ctx: &SplitContext,
    mint: splitline_transactions::MintTransaction,
    change_state: TokenState,
) -> Result<Token, SplitError> {
    let token = Token::from_genesis(mint, change_state)?;
    if !ctx.dev_mode() {
        token
            .verify(&ctx.trust_base)
            .map_err(|e| SplitError::VerificationFailed(format!("change token: {e}")))?;
    }
    Ok(token)
}

/// Give the host the change token. Returns whether it accepted it.
pub(crate) async fn hand_over_change_token(
    ctx: &SplitContext,
    token: &Token,
    warnings: &mut Vec<SplitWarning>,
) -> bool {
    match ctx.callbacks.on_change_token_created(token).await {
        Ok(()) => true,
        Err(e) => {
            warn!(token_id = %token.id(), error = %e, "change token callback failed");
            warnings.push(SplitWarning::new(SplitStage::ChangeToken, e.to_string()));
            false
        }
    }
}
