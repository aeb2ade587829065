//! Mint transaction data.

use serde::{Deserialize, Serialize};
use splitline_crypto::{keypair_from_seed, tagged_hash};
use splitline_types::{DataHash, KeyPair, RequestId, Salt, TokenId, TokenType, TransactionHash};

use crate::address::Address;
use crate::coin::CoinData;

/// Why a token may come into existence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MintReason {
    /// Issuance without a predecessor token.
    Genesis,
    /// One output of a split; references the burn of the source token.
    Split(SplitMintReason),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitMintReason {
    pub burned_token_id: TokenId,
    pub burn_request_id: RequestId,
    pub burn_transaction_hash: TransactionHash,
    /// Reason committed in the burn predicate; see [`split_outputs_hash`].
    pub outputs_hash: DataHash,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintTransactionData {
    pub token_id: TokenId,
    pub token_type: TokenType,
    pub coins: CoinData,
    /// Address the minted state must resolve to.
    pub recipient: Address,
    pub salt: Salt,
    pub reason: MintReason,
}

impl MintTransactionData {
    pub fn hash(&self) -> TransactionHash {
        let reason_bytes = match &self.reason {
            MintReason::Genesis => Vec::new(),
            MintReason::Split(split) => {
                let mut bytes = Vec::with_capacity(128);
                bytes.extend_from_slice(split.burned_token_id.as_bytes());
                bytes.extend_from_slice(split.burn_request_id.as_bytes());
                bytes.extend_from_slice(split.burn_transaction_hash.as_bytes());
                bytes.extend_from_slice(split.outputs_hash.as_bytes());
                bytes
            }
        };
        TransactionHash::new(tagged_hash(
            "mint",
            &[
                self.token_id.as_bytes(),
                self.token_type.as_bytes(),
                &self.coins.to_bytes(),
                &self.recipient.to_bytes(),
                self.salt.as_bytes(),
                &reason_bytes,
            ],
        ))
    }

    /// Pseudo source state of a mint. Unique per token id, so a token id can
    /// be minted at most once.
    pub fn source_state_hash(&self) -> DataHash {
        DataHash::new(tagged_hash("mint-source", &[self.token_id.as_bytes()]))
    }

    /// Deterministic key that authenticates this token's mint commitment.
    pub fn minter_keypair(&self) -> KeyPair {
        keypair_from_seed(&tagged_hash("minter", &[self.token_id.as_bytes()]))
    }

    pub fn split_reason(&self) -> Option<&SplitMintReason> {
        match &self.reason {
            MintReason::Split(reason) => Some(reason),
            MintReason::Genesis => None,
        }
    }
}

/// Commitment to the full set of tokens a split produces.
///
/// Order-independent: outputs are sorted by token id before hashing.
pub fn split_outputs_hash(outputs: &[(TokenId, &CoinData)]) -> DataHash {
    let mut sorted: Vec<&(TokenId, &CoinData)> = outputs.iter().collect();
    sorted.sort_by_key(|(id, _)| *id);
    let encoded: Vec<Vec<u8>> = sorted
        .iter()
        .map(|(id, coins)| {
            let mut bytes = id.as_bytes().to_vec();
            bytes.extend_from_slice(&coins.to_bytes());
            bytes
        })
        .collect();
    let fields: Vec<&[u8]> = encoded.iter().map(Vec::as_slice).collect();
    DataHash::new(tagged_hash("split-outputs", &fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use splitline_types::CoinId;

    fn data(reason: MintReason) -> MintTransactionData {
        MintTransactionData {
            token_id: TokenId::new([1; 32]),
            token_type: TokenType::new([2; 32]),
            coins: CoinData::single(CoinId::new([3; 32]), 700_000),
            recipient: Address::Direct(DataHash::new([4; 32])),
            salt: Salt::new([5; 32]),
            reason,
        }
    }

    #[test]
    fn reason_changes_hash() {
        let genesis = data(MintReason::Genesis);
        let split = data(MintReason::Split(SplitMintReason {
            burned_token_id: TokenId::new([9; 32]),
            burn_request_id: RequestId::new([8; 32]),
            burn_transaction_hash: TransactionHash::new([7; 32]),
            outputs_hash: DataHash::new([6; 32]),
        }));
        assert_ne!(genesis.hash(), split.hash());
    }

    #[test]
    fn minter_key_is_deterministic_per_token() {
        let a = data(MintReason::Genesis);
        let b = data(MintReason::Genesis);
        assert_eq!(a.minter_keypair().public, b.minter_keypair().public);
    }

    #[test]
    fn outputs_hash_is_order_independent() {
        let c1 = CoinData::single(CoinId::new([1; 32]), 700);
        let c2 = CoinData::single(CoinId::new([1; 32]), 300);
        let a = split_outputs_hash(&[(TokenId::new([1; 32]), &c1), (TokenId::new([2; 32]), &c2)]);
        let b = split_outputs_hash(&[(TokenId::new([2; 32]), &c2), (TokenId::new([1; 32]), &c1)]);
        assert_eq!(a, b);
    }
}
