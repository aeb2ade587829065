//! Recipient addresses.
//!
//! A direct address is the reference of a predicate. A proxy address names a
//! nametag token instead; transfers to it can only be finalized by whoever
//! presents that nametag token.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use splitline_crypto::tagged_hash;
use splitline_types::{DataHash, TokenId};
use std::fmt;
use std::str::FromStr;

use crate::error::TransactionError;

const DIRECT_SCHEME: &str = "DIRECT://";
const PROXY_SCHEME: &str = "PROXY://";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Address {
    Direct(DataHash),
    Proxy(TokenId),
}

impl Address {
    /// Proxy address for a human-readable name (`@alice` and `alice` are the same name).
    pub fn proxy_for_name(name: &str) -> Self {
        Self::Proxy(nametag_token_id(name))
    }

    pub fn is_proxy(&self) -> bool {
        matches!(self, Self::Proxy(_))
    }

    /// The nametag token id, for proxy addresses.
    pub fn nametag_token_id(&self) -> Option<TokenId> {
        match self {
            Self::Proxy(id) => Some(*id),
            Self::Direct(_) => None,
        }
    }

    /// Canonical bytes for hashing: one scheme byte then the 32-byte payload.
    pub fn to_bytes(&self) -> [u8; 33] {
        let mut out = [0u8; 33];
        match self {
            Self::Direct(reference) => {
                out[0] = 0;
                out[1..].copy_from_slice(reference.as_bytes());
            }
            Self::Proxy(token_id) => {
                out[0] = 1;
                out[1..].copy_from_slice(token_id.as_bytes());
            }
        }
        out
    }
}

/// Token id of the nametag token that backs `name`.
pub fn nametag_token_id(name: &str) -> TokenId {
    let normalized = name.trim().trim_start_matches('@').to_lowercase();
    TokenId::new(tagged_hash("nametag", &[normalized.as_bytes()]))
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(reference) => write!(f, "{DIRECT_SCHEME}{reference}"),
            Self::Proxy(token_id) => write!(f, "{PROXY_SCHEME}{token_id}"),
        }
    }
}

impl FromStr for Address {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = s.strip_prefix(DIRECT_SCHEME) {
            let reference = DataHash::from_hex(rest)
                .map_err(|e| TransactionError::InvalidAddress(format!("{s}: {e}")))?;
            Ok(Self::Direct(reference))
        } else if let Some(rest) = s.strip_prefix(PROXY_SCHEME) {
            let token_id = TokenId::from_hex(rest)
                .map_err(|e| TransactionError::InvalidAddress(format!("{s}: {e}")))?;
            Ok(Self::Proxy(token_id))
        } else {
            Err(TransactionError::InvalidAddress(format!(
                "unknown address scheme: {s}"
            )))
        }
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_roundtrip() {
        let direct = Address::Direct(DataHash::new([4u8; 32]));
        let proxy = Address::proxy_for_name("alice");
        for addr in [direct, proxy] {
            let parsed: Address = addr.to_string().parse().unwrap();
            assert_eq!(parsed, addr);
        }
    }

    #[test]
    fn proxy_name_is_normalized() {
        assert_eq!(
            Address::proxy_for_name("@Alice"),
            Address::proxy_for_name("alice")
        );
        assert_ne!(
            Address::proxy_for_name("alice"),
            Address::proxy_for_name("bob")
        );
    }

    #[test]
    fn unknown_scheme_rejected() {
        assert!(matches!(
            "HTTP://abc".parse::<Address>(),
            Err(TransactionError::InvalidAddress(_))
        ));
    }

    #[test]
    fn direct_and_proxy_bytes_differ() {
        let bytes = [9u8; 32];
        let direct = Address::Direct(DataHash::new(bytes));
        let proxy = Address::Proxy(TokenId::new(bytes));
        assert_ne!(direct.to_bytes(), proxy.to_bytes());
    }
}
