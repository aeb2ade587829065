//! Commitments: transaction data plus the authenticator the ledger checks.

use serde::{Deserialize, Serialize};
use splitline_crypto::{sign_message, tagged_hash, verify_signature};
use splitline_types::{DataHash, KeyPair, PublicKey, RequestId, Signature, TokenId, TransactionHash};

use crate::error::TransactionError;
use crate::mint::MintTransactionData;
use crate::transfer::TransferTransactionData;

/// Behaviour shared by mint and transfer bodies.
pub trait TransactionData {
    fn hash(&self) -> TransactionHash;

    /// State being consumed. The ledger keys requests on it.
    fn source_state_hash(&self) -> DataHash;

    fn token_id(&self) -> TokenId;

    /// Key that must have signed the commitment, `None` if nobody can.
    fn expected_signer(&self) -> Option<PublicKey>;
}

impl TransactionData for MintTransactionData {
    fn hash(&self) -> TransactionHash {
        MintTransactionData::hash(self)
    }

    fn source_state_hash(&self) -> DataHash {
        MintTransactionData::source_state_hash(self)
    }

    fn token_id(&self) -> TokenId {
        self.token_id
    }

    fn expected_signer(&self) -> Option<PublicKey> {
        Some(self.minter_keypair().public)
    }
}

impl TransactionData for TransferTransactionData {
    fn hash(&self) -> TransactionHash {
        TransferTransactionData::hash(self)
    }

    fn source_state_hash(&self) -> DataHash {
        TransferTransactionData::source_state_hash(self)
    }

    fn token_id(&self) -> TokenId {
        self.token_id
    }

    fn expected_signer(&self) -> Option<PublicKey> {
        self.source_state.predicate.owner().cloned()
    }
}

/// Request id of a spend: one per (signer, source state).
///
/// Two spends of the same state by the same key collide here, which is
/// what lets the ledger refuse a double spend.
pub fn request_id_for(public_key: &PublicKey, state_hash: &DataHash) -> RequestId {
    RequestId::new(tagged_hash(
        "request-id",
        &[public_key.as_bytes(), state_hash.as_bytes()],
    ))
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authenticator {
    pub public_key: PublicKey,
    /// Signature over the transaction hash.
    pub signature: Signature,
    pub state_hash: DataHash,
}

impl Authenticator {
    fn sign(transaction_hash: &TransactionHash, state_hash: DataHash, keypair: &KeyPair) -> Self {
        Self {
            public_key: keypair.public.clone(),
            signature: sign_message(transaction_hash.as_bytes(), &keypair.private),
            state_hash,
        }
    }
}

/// A signed request to the ledger, before it has been ordered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commitment<D> {
    pub request_id: RequestId,
    pub transaction_data: D,
    pub authenticator: Authenticator,
}

pub type MintCommitment = Commitment<MintTransactionData>;
pub type TransferCommitment = Commitment<TransferTransactionData>;

impl<D: TransactionData> Commitment<D> {
    fn sign_with(transaction_data: D, keypair: &KeyPair) -> Self {
        let state_hash = transaction_data.source_state_hash();
        let authenticator = Authenticator::sign(&transaction_data.hash(), state_hash, keypair);
        Self {
            request_id: request_id_for(&keypair.public, &state_hash),
            transaction_data,
            authenticator,
        }
    }

    pub fn transaction_hash(&self) -> TransactionHash {
        self.transaction_data.hash()
    }

    pub fn token_id(&self) -> TokenId {
        self.transaction_data.token_id()
    }

    /// The checks the ledger runs before accepting a submission.
    pub fn verify(&self) -> Result<(), TransactionError> {
        let auth = &self.authenticator;
        let source = self.transaction_data.source_state_hash();
        if auth.state_hash != source {
            return Err(TransactionError::StateHashMismatch {
                expected: source.to_hex(),
                got: auth.state_hash.to_hex(),
            });
        }
        let expected_request = request_id_for(&auth.public_key, &auth.state_hash);
        if self.request_id != expected_request {
            return Err(TransactionError::RequestIdMismatch {
                expected: expected_request.to_hex(),
                got: self.request_id.to_hex(),
            });
        }
        match self.transaction_data.expected_signer() {
            Some(signer) if signer == auth.public_key => {}
            _ => return Err(TransactionError::NotOwner),
        }
        if !verify_signature(
            self.transaction_hash().as_bytes(),
            &auth.signature,
            &auth.public_key,
        ) {
            return Err(TransactionError::InvalidSignature {
                what: "commitment authenticator",
            });
        }
        Ok(())
    }
}

impl Commitment<MintTransactionData> {
    /// Mint commitments are signed by the token's deterministic minter key,
    /// so anyone holding the mint data rebuilds the identical commitment.
    pub fn create(data: MintTransactionData) -> Self {
        let minter = data.minter_keypair();
        Self::sign_with(data, &minter)
    }
}

impl Commitment<TransferTransactionData> {
    /// Sign a transfer out of `data.source_state` with the owner's key.
    pub fn create(data: TransferTransactionData, owner: &KeyPair) -> Result<Self, TransactionError> {
        if !data.source_state.predicate.is_owned_by(&owner.public) {
            return Err(TransactionError::NotOwner);
        }
        Ok(Self::sign_with(data, owner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::coin::CoinData;
    use crate::mint::MintReason;
    use crate::predicate::Predicate;
    use crate::state::TokenState;
    use splitline_crypto::keypair_from_seed;
    use splitline_types::{CoinId, Salt, TokenType};

    fn mint_data(id: u8) -> MintTransactionData {
        MintTransactionData {
            token_id: TokenId::new([id; 32]),
            token_type: TokenType::new([2; 32]),
            coins: CoinData::single(CoinId::new([3; 32]), 1_000),
            recipient: Address::Direct(DataHash::new([4; 32])),
            salt: Salt::new([5; 32]),
            reason: MintReason::Genesis,
        }
    }

    fn transfer_from(owner: &KeyPair) -> TransferTransactionData {
        let state = TokenState::new(Predicate::unmasked(owner.public.clone(), Salt::ZERO));
        TransferTransactionData {
            token_id: TokenId::new([1; 32]),
            source_state: state,
            recipient: Address::Direct(DataHash::new([6; 32])),
            salt: Salt::new([7; 32]),
            message: None,
        }
    }

    #[test]
    fn mint_commitment_is_reproducible() {
        let a = MintCommitment::create(mint_data(1));
        let b = MintCommitment::create(mint_data(1));
        assert_eq!(a, b);
        a.verify().unwrap();
    }

    #[test]
    fn transfer_requires_owner_key() {
        let owner = keypair_from_seed(&[1; 32]);
        let stranger = keypair_from_seed(&[2; 32]);
        assert!(matches!(
            TransferCommitment::create(transfer_from(&owner), &stranger),
            Err(TransactionError::NotOwner)
        ));
        let commitment = TransferCommitment::create(transfer_from(&owner), &owner).unwrap();
        commitment.verify().unwrap();
    }

    #[test]
    fn same_state_same_request_id() {
        let owner = keypair_from_seed(&[1; 32]);
        let a = TransferCommitment::create(transfer_from(&owner), &owner).unwrap();
        let mut other = transfer_from(&owner);
        other.salt = Salt::new([9; 32]);
        let b = TransferCommitment::create(other, &owner).unwrap();
        assert_eq!(a.request_id, b.request_id);
        assert_ne!(a.transaction_hash(), b.transaction_hash());
    }

    #[test]
    fn tampered_data_fails_verification() {
        let mut commitment = MintCommitment::create(mint_data(1));
        commitment.transaction_data.coins = CoinData::single(CoinId::new([3; 32]), 2_000);
        assert!(matches!(
            commitment.verify(),
            Err(TransactionError::InvalidSignature { .. })
        ));
    }
}
