//! Transfer transaction data (burns are transfers to a burn predicate).

use serde::{Deserialize, Serialize};
use splitline_crypto::tagged_hash;
use splitline_types::{DataHash, Salt, TokenId, TransactionHash};

use crate::address::Address;
use crate::state::TokenState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferTransactionData {
    pub token_id: TokenId,
    /// State being spent. Its predicate owner signs the commitment.
    pub source_state: TokenState,
    pub recipient: Address,
    /// Salt the recipient uses to derive its new predicate.
    pub salt: Salt,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TransferTransactionData {
    pub fn hash(&self) -> TransactionHash {
        let message = self.message.as_deref().unwrap_or("");
        TransactionHash::new(tagged_hash(
            "transfer",
            &[
                self.token_id.as_bytes(),
                self.source_state.hash().as_bytes(),
                &self.recipient.to_bytes(),
                self.salt.as_bytes(),
                message.as_bytes(),
            ],
        ))
    }

    pub fn source_state_hash(&self) -> DataHash {
        self.source_state.hash()
    }
}
