//! Cryptographic primitives for Splitline.
//!
//! - **Ed25519** for commitment authenticators and ledger proof signatures
//! - **Blake2b** for protocol hashing (state hashes, request ids, transaction hashes)
//! - **SHA-256** split-seed derivation behind the injectable [`SplitHasher`]
//! - OS randomness behind the injectable [`RandomSource`]

pub mod hash;
pub mod hasher;
pub mod keys;
pub mod random;

pub use hash::tagged_hash;
pub use hasher::{Sha256SplitHasher, SplitHasher};
pub use keys::{
    generate_keypair, keypair_from_private, keypair_from_seed, public_from_private,
    sign_message, verify_signature,
};
pub use random::{OsRandom, RandomSource};
