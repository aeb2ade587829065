//! Sender side of an instant split.
//!
//! The critical path is burn, burn proof, derive both mints, build the
//! recipient transfer straight from the unproven mint data, deliver. Only
//! the burn proof is awaited; everything else the sender owes the ledger is
//! handed to the [`BackgroundReconciler`].

use splitline_token::Token;
use splitline_transactions::{
    split_outputs_hash, validate_burn, Address, MintCommitment, MintReason, MintTransactionData,
    Predicate, SplitMintReason, TokenState, Transaction, TransferCommitment,
    TransferTransactionData,
};
use splitline_transport::{DeliveryId, DeliveryMessage, Transport};
use splitline_types::PublicKey;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn, Instrument};

use crate::bundle::{
    BundleBody, BundleV4, BundleV5, SplitBundle, SplitOutput, VERSION_V4, VERSION_V5,
};
use crate::context::SplitContext;
use crate::error::{SplitError, SplitStage, SplitWarning};
use crate::planner::SplitPlan;
use crate::reconciler::{BackgroundJob, BackgroundReconciler, BackgroundTask};
use crate::records::{RecoveryMetadata, RecoveryStatus, SplitGroupId};
use crate::tracing_spans::split_execute_span;

/// What to split and where the split-off amount goes.
#[derive(Clone, Debug)]
pub struct SplitRequest {
    pub token: Token,
    pub coin_id: splitline_types::CoinId,
    pub split_amount: u128,
    pub change_amount: u128,
    pub recipient: Address,
    /// Transport-level identity of the recipient.
    pub recipient_pubkey: PublicKey,
    /// Nametag backing a proxy `recipient`, embedded into the bundle.
    pub nametag: Option<Token>,
    pub message: Option<String>,
}

/// Successful critical path. The bundle is delivered; `background` is still
/// running.
#[derive(Debug)]
pub struct SplitDelivery {
    pub delivery_id: DeliveryId,
    pub split_group_id: SplitGroupId,
    pub critical_path_duration_ms: u64,
    pub bundle: SplitBundle,
    pub background: BackgroundTask,
    pub warnings: Vec<SplitWarning>,
}

/// A split whose critical path did not complete.
#[derive(Debug)]
pub struct SplitFailure {
    pub error: SplitError,
    pub split_group_id: SplitGroupId,
    pub critical_path_duration_ms: u64,
    /// Set when the burn went through but delivery failed: the bundle to
    /// hand to [`SplitExecutor::redeliver`] later.
    pub bundle: Option<SplitBundle>,
    /// Set alongside `bundle`. The sender's side of the split does not
    /// depend on delivery, so it is reconciled anyway.
    pub background: Option<BackgroundTask>,
}

/// Commitments built for one split before anything is submitted.
struct PreparedSplit {
    plan: SplitPlan,
    burn: TransferCommitment,
    recipient_mint: MintCommitment,
    sender_mint: MintCommitment,
    minted_state: TokenState,
    change_state: TokenState,
}

/// Burn accepted, bundle built and persisted, nothing delivered yet.
struct StagedSplit {
    split_group_id: SplitGroupId,
    recipient_pubkey: PublicKey,
    bundle: SplitBundle,
    payload: String,
    job: BackgroundJob,
    warnings: Vec<SplitWarning>,
}

pub struct SplitExecutor {
    ctx: SplitContext,
    transport: Arc<dyn Transport>,
}

impl SplitExecutor {
    pub fn new(ctx: SplitContext, transport: Arc<dyn Transport>) -> Self {
        Self { ctx, transport }
    }

    /// Run the critical path of a split.
    ///
    /// Returns once the bundle is delivered. Background failures never turn
    /// a returned [`SplitDelivery`] into a failure.
    pub async fn execute(&self, request: SplitRequest) -> Result<SplitDelivery, SplitFailure> {
        let start = Instant::now();
        let split_group_id = SplitGroupId::generate(self.ctx.random.as_ref());
        let span = split_execute_span(&split_group_id);
        match self
            .stage(request, split_group_id)
            .instrument(span.clone())
            .await
        {
            Ok(staged) => self.deliver(staged, start).instrument(span).await,
            Err(error) => Err(self.failure(error, split_group_id, start, None)),
        }
    }

    /// Deliver a bundle built by an earlier [`execute`](Self::execute) call.
    pub async fn redeliver(
        &self,
        bundle: &SplitBundle,
        recipient_pubkey: &PublicKey,
    ) -> Result<DeliveryId, SplitError> {
        let payload = bundle.to_json()?;
        self.send(bundle.body(), payload, recipient_pubkey).await
    }

    async fn send(
        &self,
        body: &BundleBody,
        payload: String,
        recipient_pubkey: &PublicKey,
    ) -> Result<DeliveryId, SplitError> {
        let message = DeliveryMessage::new(payload).with_memo(format!(
            "Instant split {}: {} of coin {}",
            body.split_group_id, body.amount, body.coin_id
        ));
        Ok(self.transport.deliver(recipient_pubkey, message).await?)
    }

    fn failure(
        &self,
        error: SplitError,
        split_group_id: SplitGroupId,
        start: Instant,
        undelivered: Option<(SplitBundle, BackgroundTask)>,
    ) -> SplitFailure {
        let critical_path_duration_ms = splitline_utils::elapsed_ms(start);
        warn!(
            split_group_id = %split_group_id,
            error = %error,
            elapsed_ms = critical_path_duration_ms,
            burned = undelivered.is_some(),
            "split failed"
        );
        let (bundle, background) = match undelivered {
            Some((bundle, background)) => (Some(bundle), Some(background)),
            None => (None, None),
        };
        SplitFailure {
            error,
            split_group_id,
            critical_path_duration_ms,
            bundle,
            background,
        }
    }

    /// Everything up to delivery: plan, burn, burn proof, bundle. The bundle
    /// is persisted with the recovery metadata before it leaves.
    async fn stage(
        &self,
        request: SplitRequest,
        split_group_id: SplitGroupId,
    ) -> Result<StagedSplit, SplitError> {
        let mut warnings = Vec::new();
        let legacy = self.ctx.config.emit_legacy_bundles;
        if legacy && !self.ctx.dev_mode() {
            return Err(SplitError::DevModeRequired("legacy bundle emission"));
        }
        let version = if legacy { VERSION_V4 } else { VERSION_V5 };

        if !request
            .token
            .state
            .predicate
            .is_owned_by(self.ctx.identity.public_key())
        {
            return Err(SplitError::NotOwner);
        }
        check_nametag(&request)?;

        let prepared = self.prepare(&request)?;
        let plan = &prepared.plan;
        info!(
            split_group_id = %split_group_id,
            token_id = %plan.original_token_id,
            split_amount = %plan.split_amount,
            change_amount = %plan.change_amount,
            seed_hasher = self.ctx.planner().hasher_name(),
            version,
            "starting split"
        );

        let mut metadata = RecoveryMetadata {
            split_group_id,
            status: RecoveryStatus::Started,
            version: version.to_string(),
            sender_token_id: plan.sender_token_id,
            sender_salt: plan.sender_salt,
            change_amount: plan.change_amount,
            split_amount: plan.split_amount,
            seed_string: plan.seed.clone(),
            original_token_id: plan.original_token_id,
            coin_id: plan.coin_id,
            token_type: request.token.token_type(),
            change_coins: prepared.sender_mint.transaction_data.coins.clone(),
            sender_mint_commitment: prepared.sender_mint.clone(),
            bundle_json: None,
            updated_at: self.ctx.clock.now(),
        };
        self.persist(&metadata, &mut warnings).await;

        let status = self.ctx.ledger.submit_transfer(&prepared.burn).await?;
        if !status.is_accepted() {
            return Err(SplitError::rejected(SplitStage::Burn, status));
        }
        debug!(request_id = %prepared.burn.request_id, status = %status, "burn submitted");

        let transfer = self.transfer_commitment(&request, &prepared)?;
        let sender_mint_data = &prepared.sender_mint.transaction_data;
        let body = BundleBody {
            recipient_mint_data: prepared.recipient_mint.transaction_data.clone(),
            transfer_commitment: transfer.clone(),
            change_output: SplitOutput {
                token_id: sender_mint_data.token_id,
                coins: sender_mint_data.coins.clone(),
            },
            amount: plan.split_amount,
            coin_id: plan.coin_id,
            token_type: request.token.token_type(),
            split_group_id,
            sender_pubkey: self.ctx.identity.public_key().clone(),
            recipient_salt: plan.recipient_salt,
            transfer_salt: plan.transfer_salt,
            minted_token_state: prepared.minted_state.clone(),
            recipient_address: request.recipient,
            nametag_token: request.nametag.clone(),
        };

        let bundle = if legacy {
            SplitBundle::V4(BundleV4 {
                burn_commitment: prepared.burn.clone(),
                body,
            })
        } else {
            let proof = self
                .ctx
                .proof_waiter()
                .wait(
                    SplitStage::BurnProof,
                    prepared.burn.request_id,
                    prepared.burn.transaction_hash(),
                )
                .await?;
            let burn_transaction = Transaction::from_commitment(&prepared.burn, proof)?;
            let burn_json = serde_json::to_string(&burn_transaction)?;
            if let Err(e) = self
                .ctx
                .callbacks
                .on_burn_completed(&split_group_id, &burn_json)
                .await
            {
                warnings.push(SplitWarning::new(SplitStage::BurnProof, e.to_string()));
            }
            SplitBundle::V5(BundleV5 {
                burn_transaction,
                body,
            })
        };

        let payload = bundle.to_json()?;
        metadata.status = RecoveryStatus::BundleReady;
        metadata.bundle_json = Some(payload.clone());
        metadata.updated_at = self.ctx.clock.now();
        self.persist(&metadata, &mut warnings).await;

        Ok(StagedSplit {
            split_group_id,
            recipient_pubkey: request.recipient_pubkey,
            bundle,
            payload,
            job: BackgroundJob {
                split_group_id,
                sender_mint: prepared.sender_mint,
                recipient_mint: prepared.recipient_mint,
                transfer,
                change_state: prepared.change_state,
                metadata: Some(metadata),
            },
            warnings,
        })
    }

    async fn deliver(
        &self,
        staged: StagedSplit,
        start: Instant,
    ) -> Result<SplitDelivery, SplitFailure> {
        let StagedSplit {
            split_group_id,
            recipient_pubkey,
            bundle,
            payload,
            mut job,
            mut warnings,
        } = staged;

        let delivery_id = match self.send(bundle.body(), payload, &recipient_pubkey).await {
            Ok(id) => id,
            Err(error) => {
                let background = BackgroundReconciler::new(self.ctx.clone()).spawn(job);
                return Err(self.failure(error, split_group_id, start, Some((bundle, background))));
            }
        };
        let critical_path_duration_ms = splitline_utils::elapsed_ms(start);
        info!(
            split_group_id = %split_group_id,
            delivery_id = %delivery_id,
            elapsed_ms = critical_path_duration_ms,
            "bundle delivered"
        );

        if let Err(e) = self
            .ctx
            .callbacks
            .on_delivered(&split_group_id, &delivery_id)
            .await
        {
            warnings.push(SplitWarning::new(SplitStage::Deliver, e.to_string()));
        }
        if let Some(metadata) = job.metadata.as_mut() {
            metadata.status = RecoveryStatus::Delivered;
            metadata.updated_at = self.ctx.clock.now();
            self.persist(metadata, &mut warnings).await;
        }

        let background = BackgroundReconciler::new(self.ctx.clone()).spawn(job);
        Ok(SplitDelivery {
            delivery_id,
            split_group_id,
            critical_path_duration_ms,
            bundle,
            background,
            warnings,
        })
    }

    /// Plan the split and build the burn and both mint commitments.
    fn prepare(&self, request: &SplitRequest) -> Result<PreparedSplit, SplitError> {
        let token = &request.token;
        let plan = self.ctx.planner().plan(
            token,
            request.coin_id,
            request.split_amount,
            request.change_amount,
            self.ctx.clock.now(),
        )?;
        let outputs = plan.outputs(token.coins());
        let outputs_hash = split_outputs_hash(&[
            (plan.recipient_token_id, &outputs.recipient),
            (plan.sender_token_id, &outputs.change),
        ]);

        let owner = self.ctx.identity.keypair();
        let burn = TransferCommitment::create(
            TransferTransactionData {
                token_id: token.id(),
                source_state: token.state.clone(),
                recipient: Predicate::burn(token.id(), outputs_hash).address(),
                salt: plan.burn_salt,
                message: None,
            },
            owner,
        )?;

        let reason = MintReason::Split(SplitMintReason {
            burned_token_id: token.id(),
            burn_request_id: burn.request_id,
            burn_transaction_hash: burn.transaction_hash(),
            outputs_hash,
        });
        let token_type = token.token_type();
        let minted_state = TokenState::new(Predicate::masked(
            owner.public.clone(),
            plan.recipient_token_id,
            token_type,
            plan.recipient_salt,
        ));
        let change_state = TokenState::new(Predicate::masked(
            owner.public.clone(),
            plan.sender_token_id,
            token_type,
            plan.sender_salt,
        ));
        let recipient_mint = MintTransactionData {
            token_id: plan.recipient_token_id,
            token_type,
            coins: outputs.recipient,
            recipient: minted_state.address(),
            salt: plan.recipient_salt,
            reason: reason.clone(),
        };
        let sender_mint = MintTransactionData {
            token_id: plan.sender_token_id,
            token_type,
            coins: outputs.change,
            recipient: change_state.address(),
            salt: plan.sender_salt,
            reason,
        };
        validate_burn(
            &burn.transaction_data,
            true,
            token.coins(),
            &[&recipient_mint, &sender_mint],
        )?;

        Ok(PreparedSplit {
            plan,
            burn,
            recipient_mint: MintCommitment::create(recipient_mint),
            sender_mint: MintCommitment::create(sender_mint),
            minted_state,
            change_state,
        })
    }

    /// Transfer of the recipient piece out of the state it will be minted
    /// to. Needs only the mint data, not its proof.
    fn transfer_commitment(
        &self,
        request: &SplitRequest,
        prepared: &PreparedSplit,
    ) -> Result<TransferCommitment, SplitError> {
        let data = TransferTransactionData {
            token_id: prepared.plan.recipient_token_id,
            source_state: prepared.minted_state.clone(),
            recipient: request.recipient,
            salt: prepared.plan.transfer_salt,
            message: request.message.clone(),
        };
        Ok(TransferCommitment::create(data, self.ctx.identity.keypair())?)
    }

    async fn persist(&self, metadata: &RecoveryMetadata, warnings: &mut Vec<SplitWarning>) {
        if let Err(e) = self.ctx.callbacks.persist_recovery_metadata(metadata).await {
            warn!(split_group_id = %metadata.split_group_id, error = %e, "failed to persist recovery metadata");
            warnings.push(SplitWarning::new(SplitStage::Persistence, e.to_string()));
        }
    }
}

/// A supplied nametag must be the one the proxy recipient names.
fn check_nametag(request: &SplitRequest) -> Result<(), SplitError> {
    match (&request.recipient, &request.nametag) {
        (Address::Proxy(expected), Some(nametag)) if nametag.id() != *expected => {
            Err(SplitError::PolicyViolation(format!(
                "nametag {} does not back {}",
                nametag.id(),
                request.recipient
            )))
        }
        (Address::Direct(_), Some(_)) => Err(SplitError::PolicyViolation(
            "nametag supplied for a direct recipient".into(),
        )),
        _ => Ok(()),
    }
}
