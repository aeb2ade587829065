//! The local signing identity.

use splitline_crypto::{generate_keypair, keypair_from_seed};
use splitline_transactions::{direct_address_for_key, Address};
use splitline_types::{KeyPair, PublicKey};
use std::fmt;

/// Key material the engine signs burns and transfers with.
///
/// Read-only once constructed; shared behind an `Arc`.
pub struct SigningIdentity {
    keypair: KeyPair,
}

impl SigningIdentity {
    pub fn new(keypair: KeyPair) -> Self {
        Self { keypair }
    }

    /// Fresh random identity.
    pub fn generate() -> Self {
        Self::new(generate_keypair())
    }

    /// Deterministic identity from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self::new(keypair_from_seed(seed))
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.keypair.public
    }

    pub fn keypair(&self) -> &KeyPair {
        &self.keypair
    }

    /// Stable direct address other wallets send to.
    pub fn direct_address(&self) -> Address {
        direct_address_for_key(&self.keypair.public)
    }
}

impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("public_key", &self.keypair.public)
            .finish_non_exhaustive()
    }
}
