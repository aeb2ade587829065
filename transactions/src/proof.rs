//! Inclusion proofs and the trust base that authenticates them.

use serde::{Deserialize, Serialize};
use splitline_crypto::{sign_message, tagged_hash, verify_signature};
use splitline_types::{KeyPair, PublicKey, RequestId, Signature, TransactionHash};

use crate::error::TransactionError;

/// Ledger evidence that a request was ordered with a given transaction hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InclusionProof {
    pub request_id: RequestId,
    pub transaction_hash: TransactionHash,
    pub round: u64,
    /// Absent on synthetic proofs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
}

impl InclusionProof {
    pub fn signing_payload(
        request_id: &RequestId,
        transaction_hash: &TransactionHash,
        round: u64,
    ) -> [u8; 32] {
        tagged_hash(
            "inclusion-proof",
            &[
                request_id.as_bytes(),
                transaction_hash.as_bytes(),
                &round.to_be_bytes(),
            ],
        )
    }

    /// Proof signed by a ledger key.
    pub fn signed(
        request_id: RequestId,
        transaction_hash: TransactionHash,
        round: u64,
        ledger_key: &KeyPair,
    ) -> Self {
        let payload = Self::signing_payload(&request_id, &transaction_hash, round);
        Self {
            request_id,
            transaction_hash,
            round,
            signature: Some(sign_message(&payload, &ledger_key.private)),
        }
    }

    /// Locally fabricated proof used only when dev mode gives up waiting.
    /// Never passes [`TrustBase::verify`].
    pub fn synthetic(request_id: RequestId, transaction_hash: TransactionHash) -> Self {
        Self {
            request_id,
            transaction_hash,
            round: 0,
            signature: None,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.signature.is_none()
    }

    pub fn matches(&self, request_id: &RequestId, transaction_hash: &TransactionHash) -> bool {
        &self.request_id == request_id && &self.transaction_hash == transaction_hash
    }
}

/// The ledger key proofs must be signed with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustBase {
    pub ledger_public_key: PublicKey,
}

impl TrustBase {
    pub fn new(ledger_public_key: PublicKey) -> Self {
        Self { ledger_public_key }
    }

    pub fn verify(&self, proof: &InclusionProof) -> Result<(), TransactionError> {
        let signature = proof
            .signature
            .as_ref()
            .ok_or(TransactionError::SyntheticProof)?;
        let payload =
            InclusionProof::signing_payload(&proof.request_id, &proof.transaction_hash, proof.round);
        if verify_signature(&payload, signature, &self.ledger_public_key) {
            Ok(())
        } else {
            Err(TransactionError::InvalidSignature {
                what: "inclusion proof",
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use splitline_crypto::keypair_from_seed;

    #[test]
    fn signed_proof_verifies_against_its_key_only() {
        let ledger = keypair_from_seed(&[1; 32]);
        let other = keypair_from_seed(&[2; 32]);
        let proof = InclusionProof::signed(
            RequestId::new([3; 32]),
            TransactionHash::new([4; 32]),
            7,
            &ledger,
        );
        TrustBase::new(ledger.public.clone()).verify(&proof).unwrap();
        assert!(TrustBase::new(other.public.clone()).verify(&proof).is_err());
    }

    #[test]
    fn synthetic_proof_never_verifies() {
        let ledger = keypair_from_seed(&[1; 32]);
        let proof = InclusionProof::synthetic(RequestId::new([3; 32]), TransactionHash::new([4; 32]));
        assert!(proof.is_synthetic());
        assert!(matches!(
            TrustBase::new(ledger.public.clone()).verify(&proof),
            Err(TransactionError::SyntheticProof)
        ));
    }

    #[test]
    fn changed_round_breaks_signature() {
        let ledger = keypair_from_seed(&[1; 32]);
        let mut proof = InclusionProof::signed(
            RequestId::new([3; 32]),
            TransactionHash::new([4; 32]),
            7,
            &ledger,
        );
        proof.round = 8;
        assert!(TrustBase::new(ledger.public.clone()).verify(&proof).is_err());
    }
}
