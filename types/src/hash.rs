//! Fixed-width identifiers and digests.
//!
//! Every identifier on the token network is 32 bytes. On the wire (JSON
//! bundles, RPC payloads) they travel as lowercase hex strings.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::TypesError;

macro_rules! bytes32_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name([u8; 32]);

        impl $name {
            pub const ZERO: Self = Self([0u8; 32]);

            pub const fn new(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            pub fn is_zero(&self) -> bool {
                self.0 == [0u8; 32]
            }

            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            /// Parse from a 64-character hex string.
            pub fn from_hex(s: &str) -> Result<Self, TypesError> {
                let bytes = hex::decode(s).map_err(|e| TypesError::InvalidHex {
                    kind: stringify!($name),
                    reason: e.to_string(),
                })?;
                let arr: [u8; 32] =
                    bytes
                        .as_slice()
                        .try_into()
                        .map_err(|_| TypesError::InvalidLength {
                            kind: stringify!($name),
                            expected: 32,
                            got: bytes.len(),
                        })?;
                Ok(Self(arr))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), hex::encode(&self.0[..4]))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", hex::encode(self.0))
            }
        }

        impl FromStr for $name {
            type Err = TypesError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_hex(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

bytes32_id!(
    /// Identity of a token, fixed at mint time.
    TokenId
);
bytes32_id!(
    /// Immutable token type (which asset class a token belongs to).
    TokenType
);
bytes32_id!(
    /// Identifier of a fungible coin carried inside a token.
    CoinId
);
bytes32_id!(
    /// Random or seed-derived salt used to blind predicates.
    Salt
);
bytes32_id!(
    /// Deterministic ledger key of a commitment: `H(public_key || source_state_hash)`.
    RequestId
);
bytes32_id!(
    /// Generic 256-bit digest (state hashes, predicate references, split reasons).
    DataHash
);
bytes32_id!(
    /// Digest of a transaction's data, signed by its authenticator.
    TransactionHash
);
