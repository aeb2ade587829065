//! Stateless validation of ordered transactions and split burns.

use std::collections::BTreeMap;

use splitline_types::{CoinId, DataHash, TokenId};

use crate::coin::CoinData;
use crate::commitment::{request_id_for, TransactionData};
use crate::error::TransactionError;
use crate::mint::{split_outputs_hash, MintTransactionData};
use crate::predicate::Predicate;
use crate::proof::TrustBase;
use crate::transfer::TransferTransactionData;
use crate::{Transaction, TransferTransaction};

/// Structural binding between a transaction and its proof. No signatures
/// are checked, so this also accepts synthetic proofs.
pub fn check_binding<D: TransactionData>(tx: &Transaction<D>) -> Result<(), TransactionError> {
    let auth = &tx.authenticator;
    let expected_request = request_id_for(&auth.public_key, &auth.state_hash);
    if tx.inclusion_proof.request_id != expected_request {
        return Err(TransactionError::RequestIdMismatch {
            expected: expected_request.to_hex(),
            got: tx.inclusion_proof.request_id.to_hex(),
        });
    }
    let tx_hash = tx.data.hash();
    if tx.inclusion_proof.transaction_hash != tx_hash {
        return Err(TransactionError::TransactionHashMismatch {
            expected: tx_hash.to_hex(),
            got: tx.inclusion_proof.transaction_hash.to_hex(),
        });
    }
    let source = tx.data.source_state_hash();
    if auth.state_hash != source {
        return Err(TransactionError::StateHashMismatch {
            expected: source.to_hex(),
            got: auth.state_hash.to_hex(),
        });
    }
    Ok(())
}

/// Full check: binding, authenticator signature and proof signature.
pub fn verify_transaction<D: TransactionData>(
    tx: &Transaction<D>,
    trust_base: &TrustBase,
) -> Result<(), TransactionError> {
    check_binding(tx)?;
    let auth = &tx.authenticator;
    match tx.data.expected_signer() {
        Some(signer) if signer == auth.public_key => {}
        _ => return Err(TransactionError::NotOwner),
    }
    if !splitline_crypto::verify_signature(
        tx.data.hash().as_bytes(),
        &auth.signature,
        &auth.public_key,
    ) {
        return Err(TransactionError::InvalidSignature {
            what: "transaction authenticator",
        });
    }
    trust_base.verify(&tx.inclusion_proof)
}

/// Check that `burn` is the burn `mints` were minted from.
///
/// The burn predicate must commit to exactly these outputs, each mint must
/// reference this burn, and the outputs must conserve `source_coins`.
pub fn validate_burn(
    burn: &TransferTransactionData,
    check_burn_hash: bool,
    source_coins: &CoinData,
    mints: &[&MintTransactionData],
) -> Result<(), TransactionError> {
    let outputs: Vec<_> = mints.iter().map(|m| (m.token_id, &m.coins)).collect();
    let outputs_hash: DataHash = split_outputs_hash(&outputs);
    let expected = Predicate::burn(burn.token_id, outputs_hash).address();
    if burn.recipient != expected {
        return Err(TransactionError::MalformedBurn(
            "burn predicate does not commit to the split outputs".into(),
        ));
    }

    let burn_hash = burn.hash();
    for mint in mints {
        let reason = mint.split_reason().ok_or_else(|| {
            TransactionError::MalformedBurn(format!("mint {} has no split reason", mint.token_id))
        })?;
        if reason.burned_token_id != burn.token_id || reason.outputs_hash != outputs_hash {
            return Err(TransactionError::MalformedBurn(format!(
                "mint {} references a different burn",
                mint.token_id
            )));
        }
        if check_burn_hash && reason.burn_transaction_hash != burn_hash {
            return Err(TransactionError::MalformedBurn(format!(
                "mint {} references a different burn transaction",
                mint.token_id
            )));
        }
    }

    let mut totals: BTreeMap<CoinId, u128> = BTreeMap::new();
    for mint in mints {
        for (coin_id, amount) in mint.coins.iter() {
            if *amount == 0 {
                return Err(TransactionError::ZeroAmount);
            }
            let total = totals.entry(*coin_id).or_insert(0);
            *total = total.checked_add(*amount).ok_or_else(|| {
                TransactionError::MalformedBurn("split output overflow".into())
            })?;
        }
    }
    let source: BTreeMap<CoinId, u128> = source_coins.iter().map(|(k, v)| (*k, *v)).collect();
    if totals != source {
        return Err(TransactionError::MalformedBurn(
            "split outputs do not conserve the burned coins".into(),
        ));
    }
    Ok(())
}

/// Recipient-side check that `mint` was derived from the proven `burn`.
///
/// A recipient sees its own mint in full and the other split outputs only
/// as `(token id, coins)` pairs. All of them together must hash to the
/// outputs hash the burn predicate commits to, so no output can be
/// enlarged after the burn was ordered. Conservation against the source
/// token is the sender's check ([`validate_burn`]).
pub fn validate_split_mint(
    burn: &TransferTransaction,
    mint: &MintTransactionData,
    siblings: &[(TokenId, &CoinData)],
) -> Result<(), TransactionError> {
    check_binding(burn)?;
    let reason = mint.split_reason().ok_or_else(|| {
        TransactionError::MalformedBurn(format!("mint {} has no split reason", mint.token_id))
    })?;
    if reason.burned_token_id != burn.data.token_id {
        return Err(TransactionError::MalformedBurn(format!(
            "mint burns {}, proof is for {}",
            reason.burned_token_id, burn.data.token_id
        )));
    }
    if reason.burn_request_id != burn.inclusion_proof.request_id {
        return Err(TransactionError::RequestIdMismatch {
            expected: burn.inclusion_proof.request_id.to_hex(),
            got: reason.burn_request_id.to_hex(),
        });
    }
    if reason.burn_transaction_hash != burn.data.hash() {
        return Err(TransactionError::TransactionHashMismatch {
            expected: burn.data.hash().to_hex(),
            got: reason.burn_transaction_hash.to_hex(),
        });
    }
    if siblings.iter().any(|(id, _)| *id == mint.token_id) {
        return Err(TransactionError::MalformedBurn(format!(
            "split output {} listed twice",
            mint.token_id
        )));
    }
    let mut outputs = vec![(mint.token_id, &mint.coins)];
    outputs.extend(siblings.iter().copied());
    if split_outputs_hash(&outputs) != reason.outputs_hash {
        return Err(TransactionError::MalformedBurn(
            "split outputs do not match the burn's outputs hash".into(),
        ));
    }
    let expected = Predicate::burn(burn.data.token_id, reason.outputs_hash).address();
    if burn.data.recipient != expected {
        return Err(TransactionError::MalformedBurn(
            "burn predicate does not commit to the mint's outputs".into(),
        ));
    }
    if mint.coins.iter().any(|(_, amount)| *amount == 0) {
        return Err(TransactionError::ZeroAmount);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::commitment::{MintCommitment, TransferCommitment};
    use crate::mint::{MintReason, SplitMintReason};
    use crate::proof::InclusionProof;
    use crate::state::TokenState;
    use splitline_crypto::keypair_from_seed;
    use splitline_types::{KeyPair, RequestId, Salt, TokenId, TokenType, TransactionHash};

    const COIN: CoinId = CoinId::ZERO;

    fn ledger() -> KeyPair {
        keypair_from_seed(&[42; 32])
    }

    fn genesis_tx() -> Transaction<MintTransactionData> {
        let data = MintTransactionData {
            token_id: TokenId::new([1; 32]),
            token_type: TokenType::new([2; 32]),
            coins: CoinData::single(COIN, 1_000),
            recipient: Address::Direct(DataHash::new([4; 32])),
            salt: Salt::new([5; 32]),
            reason: MintReason::Genesis,
        };
        let commitment = MintCommitment::create(data);
        let proof = InclusionProof::signed(
            commitment.request_id,
            commitment.transaction_hash(),
            1,
            &ledger(),
        );
        Transaction::from_commitment(&commitment, proof).unwrap()
    }

    #[test]
    fn verified_transaction_passes() {
        let tx = genesis_tx();
        verify_transaction(&tx, &TrustBase::new(ledger().public.clone())).unwrap();
    }

    #[test]
    fn synthetic_proof_passes_binding_but_not_verification() {
        let mut tx = genesis_tx();
        tx.inclusion_proof =
            InclusionProof::synthetic(tx.inclusion_proof.request_id, tx.inclusion_proof.transaction_hash);
        check_binding(&tx).unwrap();
        assert!(matches!(
            verify_transaction(&tx, &TrustBase::new(ledger().public.clone())),
            Err(TransactionError::SyntheticProof)
        ));
    }

    fn split_fixture() -> (TransferTransactionData, Vec<MintTransactionData>) {
        let owner = keypair_from_seed(&[1; 32]);
        let token_id = TokenId::new([1; 32]);
        let a = TokenId::new([10; 32]);
        let b = TokenId::new([11; 32]);
        let coins_a = CoinData::single(COIN, 700);
        let coins_b = CoinData::single(COIN, 300);
        let outputs_hash = split_outputs_hash(&[(a, &coins_a), (b, &coins_b)]);
        let burn = TransferTransactionData {
            token_id,
            source_state: TokenState::new(Predicate::unmasked(owner.public.clone(), Salt::ZERO)),
            recipient: Predicate::burn(token_id, outputs_hash).address(),
            salt: Salt::new([3; 32]),
            message: None,
        };
        let burn_commitment = TransferCommitment::create(burn.clone(), &owner).unwrap();
        let reason = MintReason::Split(SplitMintReason {
            burned_token_id: token_id,
            burn_request_id: burn_commitment.request_id,
            burn_transaction_hash: burn.hash(),
            outputs_hash,
        });
        let mint = |id: TokenId, coins: CoinData| MintTransactionData {
            token_id: id,
            token_type: TokenType::new([2; 32]),
            coins,
            recipient: Address::Direct(DataHash::new([4; 32])),
            salt: Salt::new([5; 32]),
            reason: reason.clone(),
        };
        (burn, vec![mint(a, coins_a.clone()), mint(b, coins_b.clone())])
    }

    #[test]
    fn well_formed_split_validates() {
        let (burn, mints) = split_fixture();
        let refs: Vec<&MintTransactionData> = mints.iter().collect();
        validate_burn(&burn, true, &CoinData::single(COIN, 1_000), &refs).unwrap();
    }

    #[test]
    fn non_conserving_split_rejected() {
        let (burn, mints) = split_fixture();
        let refs: Vec<&MintTransactionData> = mints.iter().collect();
        assert!(matches!(
            validate_burn(&burn, true, &CoinData::single(COIN, 1_001), &refs),
            Err(TransactionError::MalformedBurn(_))
        ));
    }

    #[test]
    fn mint_from_other_burn_rejected() {
        let (burn, mut mints) = split_fixture();
        if let MintReason::Split(reason) = &mut mints[0].reason {
            reason.burn_transaction_hash = TransactionHash::new([99; 32]);
            reason.burn_request_id = RequestId::new([98; 32]);
        }
        let refs: Vec<&MintTransactionData> = mints.iter().collect();
        assert!(validate_burn(&burn, true, &CoinData::single(COIN, 1_000), &refs).is_err());
        validate_burn(&burn, false, &CoinData::single(COIN, 1_000), &refs).unwrap();
    }

    #[test]
    fn recipient_side_split_mint_check() {
        let owner = keypair_from_seed(&[1; 32]);
        let (burn, mints) = split_fixture();
        let commitment = TransferCommitment::create(burn, &owner).unwrap();
        let proof = InclusionProof::signed(
            commitment.request_id,
            commitment.transaction_hash(),
            3,
            &ledger(),
        );
        let burn_tx = Transaction::from_commitment(&commitment, proof).unwrap();
        let change = [(mints[1].token_id, &mints[1].coins)];
        validate_split_mint(&burn_tx, &mints[0], &change).unwrap();

        let mut foreign = mints[1].clone();
        foreign.reason = MintReason::Genesis;
        let other = [(mints[0].token_id, &mints[0].coins)];
        assert!(validate_split_mint(&burn_tx, &foreign, &other).is_err());
    }

    #[test]
    fn inflated_split_output_rejected() {
        let owner = keypair_from_seed(&[1; 32]);
        let (burn, mints) = split_fixture();
        let commitment = TransferCommitment::create(burn, &owner).unwrap();
        let proof = InclusionProof::signed(
            commitment.request_id,
            commitment.transaction_hash(),
            3,
            &ledger(),
        );
        let burn_tx = Transaction::from_commitment(&commitment, proof).unwrap();
        let change = [(mints[1].token_id, &mints[1].coins)];

        let mut inflated = mints[0].clone();
        inflated.coins = CoinData::single(COIN, 900);
        assert!(matches!(
            validate_split_mint(&burn_tx, &inflated, &change),
            Err(TransactionError::MalformedBurn(_))
        ));

        let shrunk_change = CoinData::single(COIN, 100);
        assert!(validate_split_mint(&burn_tx, &inflated, &[(mints[1].token_id, &shrunk_change)]).is_err());
        assert!(validate_split_mint(&burn_tx, &mints[0], &[]).is_err());
        assert!(validate_split_mint(&burn_tx, &mints[0], &[(mints[0].token_id, &mints[0].coins)]).is_err());
    }
}
