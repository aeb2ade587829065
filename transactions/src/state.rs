//! Token state: the active predicate of a token.

use serde::{Deserialize, Serialize};
use splitline_crypto::tagged_hash;
use splitline_types::DataHash;

use crate::address::Address;
use crate::predicate::Predicate;

/// The current ownership of a token. Replaced (never edited) by each
/// transfer; previous states live on inside the transaction history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenState {
    pub predicate: Predicate,
}

impl TokenState {
    pub fn new(predicate: Predicate) -> Self {
        Self { predicate }
    }

    pub fn hash(&self) -> DataHash {
        DataHash::new(tagged_hash(
            "token-state",
            &[self.predicate.hash().as_bytes()],
        ))
    }

    pub fn address(&self) -> Address {
        self.predicate.address()
    }
}
