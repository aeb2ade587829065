//! Token representation, finalization and verification.

use serde::{Deserialize, Serialize};
use splitline_transactions::{
    check_binding, verify_transaction, Address, CoinData, MintTransaction, TokenState,
    TransferTransaction, TrustBase,
};
use splitline_types::{CoinId, PublicKey, TokenId, TokenType};

use crate::error::TokenError;

/// Whether [`Token::finalize`] enforces the proxy-address nametag binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NametagCheck {
    Enforce,
    /// Dev mode only.
    Skip,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub genesis: MintTransaction,
    /// Proven transfers, oldest first.
    pub transactions: Vec<TransferTransaction>,
    pub state: TokenState,
    /// Nametag tokens backing proxy-addressed transfers into this token.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nametags: Vec<Token>,
}

impl Token {
    /// Token as created by a proven mint, owned by `state`.
    ///
    /// `state` must resolve to the mint's recipient address.
    pub fn from_genesis(genesis: MintTransaction, state: TokenState) -> Result<Self, TokenError> {
        check_binding(&genesis)?;
        match genesis.data.recipient {
            Address::Direct(_) => expect_address(&genesis.data.recipient, &state)?,
            Address::Proxy(_) => {
                return Err(TokenError::ProxyMint(genesis.data.recipient.to_string()))
            }
        }
        Ok(Self {
            genesis,
            transactions: Vec::new(),
            state,
            nametags: Vec::new(),
        })
    }

    pub fn id(&self) -> TokenId {
        self.genesis.data.token_id
    }

    pub fn token_type(&self) -> TokenType {
        self.genesis.data.token_type
    }

    pub fn coins(&self) -> &CoinData {
        &self.genesis.data.coins
    }

    pub fn amount_of(&self, coin_id: &CoinId) -> u128 {
        self.coins().amount_of(coin_id)
    }

    pub fn owner(&self) -> Option<&PublicKey> {
        self.state.predicate.owner()
    }

    pub fn is_burned(&self) -> bool {
        self.state.predicate.is_burn()
    }

    /// Apply a proven transfer, moving the token to `final_state`.
    ///
    /// Structural only: the transfer must spend the current state, bind to
    /// its proof, and land on an address `final_state` satisfies. Proxy
    /// recipients additionally need a nametag held by the new owner unless
    /// `check` is [`NametagCheck::Skip`].
    pub fn finalize(
        self,
        final_state: TokenState,
        transfer: TransferTransaction,
        nametags: Vec<Token>,
        check: NametagCheck,
    ) -> Result<Self, TokenError> {
        if self.is_burned() {
            return Err(TokenError::Burned);
        }
        check_binding(&transfer)?;
        if transfer.data.token_id != self.id() {
            return Err(TokenError::TokenIdMismatch {
                expected: self.id().to_hex(),
                got: transfer.data.token_id.to_hex(),
            });
        }
        if transfer.data.source_state.hash() != self.state.hash() {
            return Err(TokenError::SourceStateMismatch);
        }
        match transfer.data.recipient {
            Address::Direct(_) => expect_address(&transfer.data.recipient, &final_state)?,
            Address::Proxy(nametag_id) if check == NametagCheck::Enforce => {
                check_nametag(nametag_id, &final_state, &nametags, &transfer.data.recipient)?
            }
            Address::Proxy(_) => {}
        }

        let mut token = self;
        token.transactions.push(transfer);
        token.state = final_state;
        token.nametags = nametags;
        Ok(token)
    }

    /// Cryptographic verification of the whole history against `trust_base`.
    pub fn verify(&self, trust_base: &TrustBase) -> Result<(), TokenError> {
        verify_transaction(&self.genesis, trust_base)?;

        let mut expected_recipient = self.genesis.data.recipient;
        for transfer in &self.transactions {
            verify_transaction(transfer, trust_base)?;
            if transfer.data.token_id != self.id() {
                return Err(TokenError::TokenIdMismatch {
                    expected: self.id().to_hex(),
                    got: transfer.data.token_id.to_hex(),
                });
            }
            let source = &transfer.data.source_state;
            match expected_recipient {
                Address::Direct(_) => expect_address(&expected_recipient, source)?,
                Address::Proxy(nametag_id) => {
                    check_nametag(nametag_id, source, &self.nametags, &expected_recipient)?
                }
            }
            expected_recipient = transfer.data.recipient;
        }
        match expected_recipient {
            Address::Direct(_) => expect_address(&expected_recipient, &self.state)?,
            Address::Proxy(nametag_id) => {
                check_nametag(nametag_id, &self.state, &self.nametags, &expected_recipient)?
            }
        }

        for nametag in &self.nametags {
            nametag.verify(trust_base)?;
        }
        Ok(())
    }
}

fn expect_address(expected: &Address, state: &TokenState) -> Result<(), TokenError> {
    let got = state.address();
    if &got != expected {
        return Err(TokenError::RecipientMismatch {
            expected: expected.to_string(),
            got: got.to_string(),
        });
    }
    Ok(())
}

fn check_nametag(
    nametag_id: TokenId,
    state: &TokenState,
    nametags: &[Token],
    address: &Address,
) -> Result<(), TokenError> {
    let nametag = nametags
        .iter()
        .find(|t| t.id() == nametag_id)
        .ok_or_else(|| TokenError::MissingNametag(address.to_string()))?;
    match (nametag.owner(), state.predicate.owner()) {
        (Some(holder), Some(owner)) if holder == owner => Ok(()),
        _ => Err(TokenError::NametagNotOwned(address.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use splitline_crypto::keypair_from_seed;
    use splitline_transactions::address::nametag_token_id;
    use splitline_transactions::{
        InclusionProof, MintCommitment, MintReason,
        MintTransactionData, Predicate, Transaction, TransferCommitment,
        TransferTransactionData,
    };
    use splitline_types::{KeyPair, Salt};

    fn ledger() -> KeyPair {
        keypair_from_seed(&[42; 32])
    }

    fn trust_base() -> TrustBase {
        TrustBase::new(ledger().public.clone())
    }

    fn mint_to(token_id: TokenId, state: &TokenState, coins: CoinData) -> Token {
        let data = MintTransactionData {
            token_id,
            token_type: TokenType::new([2; 32]),
            coins,
            recipient: state.address(),
            salt: Salt::new([5; 32]),
            reason: MintReason::Genesis,
        };
        let commitment = MintCommitment::create(data);
        let proof = InclusionProof::signed(
            commitment.request_id,
            commitment.transaction_hash(),
            1,
            &ledger(),
        );
        let tx = Transaction::from_commitment(&commitment, proof).unwrap();
        Token::from_genesis(tx, state.clone()).unwrap()
    }

    fn transfer(token: &Token, owner: &KeyPair, recipient: Address) -> TransferTransaction {
        let data = TransferTransactionData {
            token_id: token.id(),
            source_state: token.state.clone(),
            recipient,
            salt: Salt::new([8; 32]),
            message: None,
        };
        let commitment = TransferCommitment::create(data, owner).unwrap();
        let proof = InclusionProof::signed(
            commitment.request_id,
            commitment.transaction_hash(),
            2,
            &ledger(),
        );
        Transaction::from_commitment(&commitment, proof).unwrap()
    }

    fn unmasked(key: &KeyPair) -> TokenState {
        TokenState::new(Predicate::unmasked(key.public.clone(), Salt::new([8; 32])))
    }

    #[test]
    fn genesis_then_direct_transfer_verifies() {
        let alice = keypair_from_seed(&[1; 32]);
        let bob = keypair_from_seed(&[2; 32]);
        let token = mint_to(TokenId::new([1; 32]), &unmasked(&alice), CoinData::single(CoinId::ZERO, 10));
        let tx = transfer(&token, &alice, unmasked(&bob).address());
        let token = token
            .finalize(unmasked(&bob), tx, Vec::new(), NametagCheck::Enforce)
            .unwrap();
        assert_eq!(token.owner(), Some(&bob.public));
        token.verify(&trust_base()).unwrap();
    }

    #[test]
    fn wrong_final_state_rejected() {
        let alice = keypair_from_seed(&[1; 32]);
        let bob = keypair_from_seed(&[2; 32]);
        let mallory = keypair_from_seed(&[3; 32]);
        let token = mint_to(TokenId::new([1; 32]), &unmasked(&alice), CoinData::single(CoinId::ZERO, 10));
        let tx = transfer(&token, &alice, unmasked(&bob).address());
        assert!(matches!(
            token.finalize(unmasked(&mallory), tx, Vec::new(), NametagCheck::Enforce),
            Err(TokenError::RecipientMismatch { .. })
        ));
    }

    #[test]
    fn proxy_transfer_needs_held_nametag() {
        let alice = keypair_from_seed(&[1; 32]);
        let bob = keypair_from_seed(&[2; 32]);
        let address = Address::proxy_for_name("@bob");
        let nametag_id = nametag_token_id("@bob");
        let nametag = mint_to(nametag_id, &unmasked(&bob), CoinData::new());

        let token = mint_to(TokenId::new([1; 32]), &unmasked(&alice), CoinData::single(CoinId::ZERO, 10));
        let tx = transfer(&token, &alice, address);
        assert!(matches!(
            token
                .clone()
                .finalize(unmasked(&bob), tx.clone(), Vec::new(), NametagCheck::Enforce),
            Err(TokenError::MissingNametag(_))
        ));

        let finalized = token
            .finalize(unmasked(&bob), tx, vec![nametag], NametagCheck::Enforce)
            .unwrap();
        finalized.verify(&trust_base()).unwrap();
    }

    #[test]
    fn synthetic_proof_fails_verify() {
        let alice = keypair_from_seed(&[1; 32]);
        let mut token = mint_to(TokenId::new([1; 32]), &unmasked(&alice), CoinData::new());
        let request_id = token.genesis.inclusion_proof.request_id;
        let tx_hash = token.genesis.inclusion_proof.transaction_hash;
        token.genesis.inclusion_proof = InclusionProof::synthetic(request_id, tx_hash);
        assert!(token.verify(&trust_base()).is_err());
    }

    #[test]
    fn json_roundtrip_keeps_history() {
        let alice = keypair_from_seed(&[1; 32]);
        let bob = keypair_from_seed(&[2; 32]);
        let token = mint_to(TokenId::new([1; 32]), &unmasked(&alice), CoinData::single(CoinId::ZERO, 10));
        let tx = transfer(&token, &alice, unmasked(&bob).address());
        let token = token
            .finalize(unmasked(&bob), tx, Vec::new(), NametagCheck::Enforce)
            .unwrap();
        let json = serde_json::to_string(&token).unwrap();
        let back: Token = serde_json::from_str(&json).unwrap();
        assert_eq!(back.transactions.len(), 1);
        back.verify(&trust_base()).unwrap();
    }
}
