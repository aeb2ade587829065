//! Splitline transaction model and its stateless validation.
//!
//! Transaction kinds:
//! - **Mint**: creates a token state from a justification (genesis or a split burn)
//! - **Transfer**: moves a token from its current state to a new owner's address
//! - **Burn**: a transfer to an unspendable burn predicate, first step of a split
//!
//! A *commitment* is the submission-ready form of a transaction (data plus an
//! authenticator); once the ledger returns an *inclusion proof* the pair
//! becomes a [`Transaction`].

pub mod address;
pub mod coin;
pub mod commitment;
pub mod error;
pub mod mint;
pub mod predicate;
pub mod proof;
pub mod state;
pub mod transfer;
pub mod validation;

pub use address::Address;
pub use coin::CoinData;
pub use commitment::{
    request_id_for, Authenticator, Commitment, MintCommitment, TransactionData,
    TransferCommitment,
};
pub use error::TransactionError;
pub use mint::{split_outputs_hash, MintReason, MintTransactionData, SplitMintReason};
pub use predicate::{direct_address_for_key, Predicate};
pub use proof::{InclusionProof, TrustBase};
pub use state::TokenState;
pub use transfer::TransferTransactionData;
pub use validation::{check_binding, validate_burn, validate_split_mint, verify_transaction};

use serde::{Deserialize, Serialize};

/// A transaction whose commitment has been ordered by the ledger.
///
/// Only constructible from a commitment and a proof that binds to it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction<D> {
    pub data: D,
    pub authenticator: Authenticator,
    pub inclusion_proof: InclusionProof,
}

pub type MintTransaction = Transaction<MintTransactionData>;
pub type TransferTransaction = Transaction<TransferTransactionData>;

impl<D: TransactionData + Clone> Transaction<D> {
    /// Pair a commitment with its inclusion proof.
    ///
    /// Fails if the proof was issued for another request or another
    /// transaction body (e.g. a competing burn of the same state won).
    pub fn from_commitment(
        commitment: &Commitment<D>,
        proof: InclusionProof,
    ) -> Result<Self, TransactionError> {
        if proof.request_id != commitment.request_id {
            return Err(TransactionError::RequestIdMismatch {
                expected: commitment.request_id.to_hex(),
                got: proof.request_id.to_hex(),
            });
        }
        let tx_hash = commitment.transaction_hash();
        if proof.transaction_hash != tx_hash {
            return Err(TransactionError::TransactionHashMismatch {
                expected: tx_hash.to_hex(),
                got: proof.transaction_hash.to_hex(),
            });
        }
        Ok(Self {
            data: commitment.transaction_data.clone(),
            authenticator: commitment.authenticator.clone(),
            inclusion_proof: proof,
        })
    }
}

impl<D: TransactionData> Transaction<D> {
    pub fn hash(&self) -> splitline_types::TransactionHash {
        self.data.hash()
    }

    pub fn request_id(&self) -> splitline_types::RequestId {
        self.inclusion_proof.request_id
    }
}
