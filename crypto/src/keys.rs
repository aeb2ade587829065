//! Ed25519 key generation, signing and verification.

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use splitline_types::{KeyPair, PrivateKey, PublicKey, Signature};

/// Generate a new Ed25519 key pair from a secure random source.
pub fn generate_keypair() -> KeyPair {
    let signing_key = SigningKey::generate(&mut OsRng);
    let verifying_key = signing_key.verifying_key();
    KeyPair {
        public: PublicKey(verifying_key.to_bytes()),
        private: PrivateKey(signing_key.to_bytes()),
    }
}

/// Derive the public key from a private key.
pub fn public_from_private(private: &PrivateKey) -> PublicKey {
    let signing_key = SigningKey::from_bytes(&private.0);
    PublicKey(signing_key.verifying_key().to_bytes())
}

/// Reconstruct a full key pair from a private key.
pub fn keypair_from_private(private: PrivateKey) -> KeyPair {
    let public = public_from_private(&private);
    KeyPair { public, private }
}

/// Derive a key pair from a 32-byte seed (deterministic).
///
/// Mint authenticators rely on this: the minter key for a token is derived
/// from the token id, so every party builds the same mint commitment.
pub fn keypair_from_seed(seed: &[u8; 32]) -> KeyPair {
    keypair_from_private(PrivateKey(*seed))
}

/// Sign a message with a private key. Ed25519 signatures are deterministic.
pub fn sign_message(message: &[u8], private_key: &PrivateKey) -> Signature {
    let signing_key = SigningKey::from_bytes(&private_key.0);
    Signature(signing_key.sign(message).to_bytes())
}

/// Verify a signature against a message and public key.
///
/// Returns `false` for malformed keys as well as bad signatures.
pub fn verify_signature(message: &[u8], signature: &Signature, public_key: &PublicKey) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(&public_key.0) else {
        return false;
    };
    let dalek_sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    verifying_key.verify(message, &dalek_sig).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_produces_distinct_keys() {
        let a = generate_keypair();
        let b = generate_keypair();
        assert_ne!(a.public, b.public);
    }

    #[test]
    fn keypair_from_seed_deterministic() {
        let kp1 = keypair_from_seed(&[42u8; 32]);
        let kp2 = keypair_from_seed(&[42u8; 32]);
        assert_eq!(kp1.public, kp2.public);
    }

    #[test]
    fn sign_and_verify() {
        let kp = keypair_from_seed(&[3u8; 32]);
        let sig = sign_message(b"transfer digest", &kp.private);
        assert!(verify_signature(b"transfer digest", &sig, &kp.public));
        assert!(!verify_signature(b"other digest", &sig, &kp.public));
    }

    #[test]
    fn signatures_are_deterministic() {
        let kp = keypair_from_seed(&[5u8; 32]);
        assert_eq!(
            sign_message(b"mint", &kp.private),
            sign_message(b"mint", &kp.private)
        );
    }

    #[test]
    fn wrong_key_fails() {
        let kp1 = keypair_from_seed(&[1u8; 32]);
        let kp2 = keypair_from_seed(&[2u8; 32]);
        let sig = sign_message(b"x", &kp1.private);
        assert!(!verify_signature(b"x", &sig, &kp2.public));
    }

    #[test]
    fn invalid_public_key_rejected() {
        let kp = keypair_from_seed(&[8u8; 32]);
        let sig = sign_message(b"x", &kp.private);
        assert!(!verify_signature(b"x", &sig, &PublicKey([0xFF; 32])));
    }
}
