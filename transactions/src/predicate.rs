//! Ownership predicates.
//!
//! A predicate is the condition that must be satisfied to spend a token
//! state. Its *reference* is what a direct address points at.

use serde::{Deserialize, Serialize};
use splitline_crypto::tagged_hash;
use splitline_types::{DataHash, PublicKey, Salt, TokenId, TokenType};

use crate::address::Address;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum Predicate {
    /// One-time predicate: the reference covers token id, type and nonce, so
    /// its address is unlinkable to the owner's key.
    Masked {
        public_key: PublicKey,
        token_id: TokenId,
        token_type: TokenType,
        nonce: Salt,
    },
    /// Key-bound predicate whose reference depends only on the key. Backs the
    /// stable direct address a wallet publishes.
    Unmasked { public_key: PublicKey, salt: Salt },
    /// Unspendable. `reason` commits to the outputs a split mints from it.
    Burn { token_id: TokenId, reason: DataHash },
}

impl Predicate {
    pub fn masked(
        public_key: PublicKey,
        token_id: TokenId,
        token_type: TokenType,
        nonce: Salt,
    ) -> Self {
        Self::Masked {
            public_key,
            token_id,
            token_type,
            nonce,
        }
    }

    pub fn unmasked(public_key: PublicKey, salt: Salt) -> Self {
        Self::Unmasked { public_key, salt }
    }

    pub fn burn(token_id: TokenId, reason: DataHash) -> Self {
        Self::Burn { token_id, reason }
    }

    /// The digest a direct address points at.
    pub fn reference(&self) -> DataHash {
        let digest = match self {
            Self::Masked {
                public_key,
                token_id,
                token_type,
                nonce,
            } => tagged_hash(
                "predicate-ref/masked",
                &[
                    public_key.as_bytes(),
                    token_id.as_bytes(),
                    token_type.as_bytes(),
                    nonce.as_bytes(),
                ],
            ),
            Self::Unmasked { public_key, .. } => {
                tagged_hash("predicate-ref/unmasked", &[public_key.as_bytes()])
            }
            Self::Burn { token_id, reason } => tagged_hash(
                "predicate-ref/burn",
                &[token_id.as_bytes(), reason.as_bytes()],
            ),
        };
        DataHash::new(digest)
    }

    pub fn address(&self) -> Address {
        Address::Direct(self.reference())
    }

    /// Full digest of the predicate, including fields the reference omits.
    pub fn hash(&self) -> DataHash {
        let digest = match self {
            Self::Unmasked { public_key, salt } => tagged_hash(
                "predicate/unmasked",
                &[public_key.as_bytes(), salt.as_bytes()],
            ),
            other => tagged_hash("predicate", &[other.reference().as_bytes()]),
        };
        DataHash::new(digest)
    }

    /// Key that must sign a transfer out of this predicate, `None` for burns.
    pub fn owner(&self) -> Option<&PublicKey> {
        match self {
            Self::Masked { public_key, .. } | Self::Unmasked { public_key, .. } => {
                Some(public_key)
            }
            Self::Burn { .. } => None,
        }
    }

    pub fn is_owned_by(&self, key: &PublicKey) -> bool {
        self.owner() == Some(key)
    }

    pub fn is_burn(&self) -> bool {
        matches!(self, Self::Burn { .. })
    }
}

/// Stable direct address of a wallet key.
pub fn direct_address_for_key(public_key: &PublicKey) -> Address {
    Predicate::unmasked(public_key.clone(), Salt::ZERO).address()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(n: u8) -> PublicKey {
        PublicKey([n; 32])
    }

    #[test]
    fn unmasked_reference_ignores_salt() {
        let a = Predicate::unmasked(key(1), Salt::new([1; 32]));
        let b = Predicate::unmasked(key(1), Salt::new([2; 32]));
        assert_eq!(a.address(), b.address());
        assert_ne!(a.hash(), b.hash());
        assert_eq!(a.address(), direct_address_for_key(&key(1)));
    }

    #[test]
    fn masked_reference_depends_on_nonce() {
        let id = TokenId::new([7; 32]);
        let ty = TokenType::new([8; 32]);
        let a = Predicate::masked(key(1), id, ty, Salt::new([1; 32]));
        let b = Predicate::masked(key(1), id, ty, Salt::new([2; 32]));
        assert_ne!(a.address(), b.address());
    }

    #[test]
    fn burn_has_no_owner() {
        let p = Predicate::burn(TokenId::new([1; 32]), DataHash::new([2; 32]));
        assert!(p.is_burn());
        assert!(p.owner().is_none());
        assert!(!p.is_owned_by(&key(1)));
    }

    #[test]
    fn json_is_tagged() {
        let p = Predicate::unmasked(key(3), Salt::ZERO);
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["type"], "UNMASKED");
        assert!(json.get("publicKey").is_some());
        let back: Predicate = serde_json::from_value(json).unwrap();
        assert_eq!(back, p);
    }
}
