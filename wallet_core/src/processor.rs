//! Recipient side of an instant split.
//!
//! Replays a received bundle: prove the recipient mint, rebuild the minted
//! token from the sender-declared state, prove the transfer, then finalize
//! into a state owned by the local identity.

use splitline_token::{NametagCheck, Token};
use splitline_transactions::{
    validate_split_mint, verify_transaction, Address, MintCommitment, Predicate, TokenState,
    Transaction, TransferTransaction,
};
use splitline_types::{PublicKey, TokenId};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn, Instrument};

use crate::bundle::{BundleBody, SplitBundle};
use crate::callbacks::NametagResolver;
use crate::context::SplitContext;
use crate::error::{SplitError, SplitStage, SplitWarning};
use crate::records::SplitGroupId;
use crate::tracing_spans::split_process_span;

/// A finalized token received through a split.
#[derive(Debug)]
pub struct ReceivedSplit {
    pub token: Token,
    pub split_group_id: SplitGroupId,
    pub version: &'static str,
    pub elapsed_ms: u64,
    pub warnings: Vec<SplitWarning>,
}

#[derive(Debug)]
pub struct ProcessFailure {
    pub error: SplitError,
    /// `None` when the bundle could not be parsed.
    pub split_group_id: Option<SplitGroupId>,
    pub elapsed_ms: u64,
}

pub struct SplitProcessor {
    ctx: SplitContext,
    nametags: Option<Arc<dyn NametagResolver>>,
}

impl SplitProcessor {
    pub fn new(ctx: SplitContext) -> Self {
        Self {
            ctx,
            nametags: None,
        }
    }

    pub fn with_nametag_resolver(mut self, resolver: Arc<dyn NametagResolver>) -> Self {
        self.nametags = Some(resolver);
        self
    }

    /// Parse and process a bundle payload as received from the transport.
    pub async fn process_json(
        &self,
        payload: &str,
        transport_sender: &PublicKey,
    ) -> Result<ReceivedSplit, ProcessFailure> {
        let start = Instant::now();
        match SplitBundle::from_json(payload) {
            Ok(bundle) => self.process(&bundle, transport_sender).await,
            Err(error) => Err(ProcessFailure {
                error,
                split_group_id: None,
                elapsed_ms: splitline_utils::elapsed_ms(start),
            }),
        }
    }

    /// Finish the split described by `bundle`.
    ///
    /// `transport_sender` is the key the transport attributes the message
    /// to; a mismatch with the bundle's declared sender is only a warning.
    pub async fn process(
        &self,
        bundle: &SplitBundle,
        transport_sender: &PublicKey,
    ) -> Result<ReceivedSplit, ProcessFailure> {
        let start = Instant::now();
        let split_group_id = bundle.split_group_id();
        let version = bundle.version();
        let span = split_process_span(&split_group_id, version);
        let mut warnings = Vec::new();

        let result = self
            .replay(bundle, transport_sender, &mut warnings)
            .instrument(span)
            .await;

        let elapsed_ms = splitline_utils::elapsed_ms(start);
        match result {
            Ok(token) => {
                info!(
                    split_group_id = %split_group_id,
                    token_id = %token.id(),
                    elapsed_ms,
                    "split received"
                );
                Ok(ReceivedSplit {
                    token,
                    split_group_id,
                    version,
                    elapsed_ms,
                    warnings,
                })
            }
            Err(error) => {
                warn!(split_group_id = %split_group_id, error = %error, elapsed_ms, "split processing failed");
                Err(ProcessFailure {
                    error,
                    split_group_id: Some(split_group_id),
                    elapsed_ms,
                })
            }
        }
    }

    async fn replay(
        &self,
        bundle: &SplitBundle,
        transport_sender: &PublicKey,
        warnings: &mut Vec<SplitWarning>,
    ) -> Result<Token, SplitError> {
        let body = bundle.body();
        if &body.sender_pubkey != transport_sender {
            warn!(
                declared = %body.sender_pubkey,
                transport = %transport_sender,
                "bundle sender does not match transport sender"
            );
            warnings.push(SplitWarning::new(
                SplitStage::Deliver,
                format!(
                    "declared sender {} differs from transport sender {}",
                    body.sender_pubkey, transport_sender
                ),
            ));
        }
        let burn = match bundle {
            SplitBundle::V5(b) => b.burn_transaction.clone(),
            SplitBundle::V4(b) => {
                if !self.ctx.dev_mode() {
                    return Err(SplitError::DevModeRequired("bundle version 4.0"));
                }
                let status = self.ctx.ledger.submit_transfer(&b.burn_commitment).await?;
                if !status.is_accepted() {
                    return Err(SplitError::rejected(SplitStage::Burn, status));
                }
                let proof = self
                    .ctx
                    .proof_waiter()
                    .wait(
                        SplitStage::BurnProof,
                        b.burn_commitment.request_id,
                        b.burn_commitment.transaction_hash(),
                    )
                    .await?;
                Transaction::from_commitment(&b.burn_commitment, proof)?
            }
        };
        self.finish(&burn, body, warnings).await
    }

    /// Common tail of both versions, starting from a proven burn.
    async fn finish(
        &self,
        burn: &TransferTransaction,
        body: &BundleBody,
        warnings: &mut Vec<SplitWarning>,
    ) -> Result<Token, SplitError> {
        self.check_burn(burn, body)?;
        check_body(body)?;

        let mint = MintCommitment::create(body.recipient_mint_data.clone());
        let status = self.ctx.ledger.submit_mint(&mint).await?;
        if !status.is_accepted() {
            return Err(SplitError::rejected(SplitStage::RecipientMint, status));
        }
        let proof = self
            .ctx
            .proof_waiter()
            .wait(
                SplitStage::RecipientMintProof,
                mint.request_id,
                mint.transaction_hash(),
            )
            .await?;
        let minted = Token::from_genesis(
            Transaction::from_commitment(&mint, proof)?,
            body.minted_token_state.clone(),
        )?;
        debug!(token_id = %minted.id(), "recipient mint proven");

        let transfer = &body.transfer_commitment;
        transfer.verify()?;
        let status = self.ctx.ledger.submit_transfer(transfer).await?;
        if !status.is_accepted() {
            return Err(SplitError::rejected(SplitStage::Transfer, status));
        }
        let proof = self
            .ctx
            .proof_waiter()
            .wait(
                SplitStage::TransferProof,
                transfer.request_id,
                transfer.transaction_hash(),
            )
            .await?;
        let transfer_tx = Transaction::from_commitment(transfer, proof)?;

        let final_state = TokenState::new(Predicate::unmasked(
            self.ctx.identity.public_key().clone(),
            body.transfer_salt,
        ));
        let (nametags, check) = self.nametags_for(body, warnings).await?;
        let token = minted.finalize(final_state, transfer_tx, nametags, check)?;

        if !self.ctx.dev_mode() {
            token
                .verify(&self.ctx.trust_base)
                .map_err(|e| SplitError::VerificationFailed(format!("received token: {e}")))?;
        }
        Ok(token)
    }

    /// The burn must be the one this mint was split from, and its outputs
    /// hash must cover exactly this mint and the declared change piece.
    /// Outside dev mode its proof and authenticator are verified too.
    fn check_burn(&self, burn: &TransferTransaction, body: &BundleBody) -> Result<(), SplitError> {
        let change = &body.change_output;
        validate_split_mint(burn, &body.recipient_mint_data, &[(change.token_id, &change.coins)])
            .map_err(|e| SplitError::VerificationFailed(format!("burn: {e}")))?;
        if !self.ctx.dev_mode() {
            verify_transaction(burn, &self.ctx.trust_base)
                .map_err(|e| SplitError::VerificationFailed(format!("burn: {e}")))?;
        }
        Ok(())
    }

    /// Nametags to finalize with, and whether the binding is enforced.
    async fn nametags_for(
        &self,
        body: &BundleBody,
        warnings: &mut Vec<SplitWarning>,
    ) -> Result<(Vec<Token>, NametagCheck), SplitError> {
        let Address::Proxy(nametag_id) = body.transfer_commitment.transaction_data.recipient else {
            return Ok((Vec::new(), NametagCheck::Enforce));
        };
        if let Some(nametag) = &body.nametag_token {
            self.check_nametag(nametag, nametag_id)?;
            return Ok((vec![nametag.clone()], NametagCheck::Enforce));
        }
        if let Some(resolver) = &self.nametags {
            match resolver.resolve(&nametag_id).await {
                Ok(Some(nametag)) => {
                    self.check_nametag(&nametag, nametag_id)?;
                    return Ok((vec![nametag], NametagCheck::Enforce));
                }
                Ok(None) => {}
                Err(e) => warnings.push(SplitWarning::new(SplitStage::Nametag, e.to_string())),
            }
        }
        if self.ctx.dev_mode() {
            warn!(nametag_id = %nametag_id, "dev mode: finalizing proxy transfer without nametag");
            warnings.push(SplitWarning::new(
                SplitStage::Nametag,
                format!("no nametag for {nametag_id}; binding not checked (dev mode)"),
            ));
            return Ok((Vec::new(), NametagCheck::Skip));
        }
        Err(SplitError::PolicyViolation(format!(
            "no nametag token available for proxy address {}",
            Address::Proxy(nametag_id)
        )))
    }

    fn check_nametag(&self, nametag: &Token, expected: TokenId) -> Result<(), SplitError> {
        if nametag.id() != expected {
            return Err(SplitError::PolicyViolation(format!(
                "nametag {} does not back proxy address {}",
                nametag.id(),
                Address::Proxy(expected)
            )));
        }
        if !self.ctx.dev_mode() {
            nametag
                .verify(&self.ctx.trust_base)
                .map_err(|e| SplitError::VerificationFailed(format!("nametag: {e}")))?;
        }
        Ok(())
    }
}

/// Cross-check the independently serialized bundle fields against each
/// other before any of them is trusted.
fn check_body(body: &BundleBody) -> Result<(), SplitError> {
    let mint = &body.recipient_mint_data;
    let transfer = &body.transfer_commitment.transaction_data;
    let invalid = |what: &str| Err(SplitError::InvalidBundle(what.to_string()));

    if mint.salt != body.recipient_salt {
        return invalid("recipient salt does not match mint data");
    }
    if mint.token_type != body.token_type {
        return invalid("token type does not match mint data");
    }
    if mint.coins.amount_of(&body.coin_id) != body.amount {
        return invalid("amount does not match mint data");
    }
    if mint.recipient != body.minted_token_state.address() {
        return invalid("minted state does not match mint recipient");
    }
    if body.minted_token_state.predicate.owner() != Some(&body.sender_pubkey) {
        return invalid("minted state is not owned by the declared sender");
    }
    if transfer.token_id != mint.token_id {
        return invalid("transfer is for another token");
    }
    if transfer.source_state != body.minted_token_state {
        return invalid("transfer does not spend the minted state");
    }
    if transfer.salt != body.transfer_salt {
        return invalid("transfer salt does not match transfer data");
    }
    if transfer.recipient != body.recipient_address {
        return invalid("transfer recipient does not match recipient address");
    }
    Ok(())
}
