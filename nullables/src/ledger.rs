//! Nullable ledger: orders commitments in memory and signs real proofs.

use async_trait::async_trait;
use splitline_crypto::keypair_from_seed;
use splitline_ledger::{LedgerClient, LedgerError, SubmitStatus};
use splitline_token::Token;
use splitline_transactions::address::nametag_token_id;
use splitline_transactions::{
    CoinData, Commitment, InclusionProof, MintCommitment, MintReason,
    MintTransactionData, TokenState, Transaction, TransactionData, TransferCommitment, TrustBase,
};
use splitline_types::{KeyPair, RequestId, Salt, TokenId, TokenType, TransactionHash};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

const LEDGER_SEED: [u8; 32] = [0x4c; 32];

#[derive(Default)]
struct LedgerState {
    round: u64,
    proofs: HashMap<RequestId, InclusionProof>,
    /// Every submission in arrival order, accepted or not.
    submissions: Vec<(RequestId, TokenId)>,
    reject_requests: HashMap<RequestId, SubmitStatus>,
    reject_tokens: HashMap<TokenId, SubmitStatus>,
    withhold_all: bool,
    withheld: HashSet<RequestId>,
    withheld_tokens: HashSet<TokenId>,
    failing_tokens: HashSet<TokenId>,
    /// Token each ordered request belongs to.
    tokens: HashMap<RequestId, TokenId>,
    offline: bool,
}

/// An in-memory ledger for testing.
///
/// Accepts any commitment whose authenticator verifies, answers
/// `REQUEST_ID_EXISTS` for request ids it has already ordered, and signs
/// inclusion proofs with a fixed key (see [`NullLedger::trust_base`]).
pub struct NullLedger {
    key: KeyPair,
    state: Mutex<LedgerState>,
}

impl NullLedger {
    pub fn new() -> Self {
        Self {
            key: keypair_from_seed(&LEDGER_SEED),
            state: Mutex::new(LedgerState::default()),
        }
    }

    /// Trust base that accepts this ledger's proofs.
    pub fn trust_base(&self) -> TrustBase {
        TrustBase::new(self.key.public.clone())
    }

    /// Answer `status` to the next and every later submission of `request_id`.
    pub fn reject_request(&self, request_id: RequestId, status: SubmitStatus) {
        self.state
            .lock()
            .unwrap()
            .reject_requests
            .insert(request_id, status);
    }

    /// Answer `status` to every submission touching `token_id`.
    pub fn reject_token(&self, token_id: TokenId, status: SubmitStatus) {
        self.state
            .lock()
            .unwrap()
            .reject_tokens
            .insert(token_id, status);
    }

    /// Order commitments but hide every proof until switched back off.
    pub fn withhold_proofs(&self, withhold: bool) {
        self.state.lock().unwrap().withhold_all = withhold;
    }

    pub fn withhold_request(&self, request_id: RequestId) {
        self.state.lock().unwrap().withheld.insert(request_id);
    }

    pub fn release_request(&self, request_id: &RequestId) {
        self.state.lock().unwrap().withheld.remove(request_id);
    }

    /// Hide proofs of every commitment touching `token_id`.
    pub fn withhold_token(&self, token_id: TokenId) {
        self.state.lock().unwrap().withheld_tokens.insert(token_id);
    }

    pub fn release_token(&self, token_id: &TokenId) {
        self.state.lock().unwrap().withheld_tokens.remove(token_id);
    }

    /// Fail submissions touching `token_id` with a transient transport error.
    pub fn fail_token(&self, token_id: TokenId) {
        self.state.lock().unwrap().failing_tokens.insert(token_id);
    }

    /// Fail every call with a transient transport error.
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().unwrap().offline = offline;
    }

    pub fn submission_count(&self) -> usize {
        self.state.lock().unwrap().submissions.len()
    }

    /// How often `request_id` was submitted.
    pub fn submissions_of(&self, request_id: &RequestId) -> usize {
        self.state
            .lock()
            .unwrap()
            .submissions
            .iter()
            .filter(|(rid, _)| rid == request_id)
            .count()
    }

    /// How often any commitment for `token_id` was submitted.
    pub fn submissions_for_token(&self, token_id: &TokenId) -> usize {
        self.state
            .lock()
            .unwrap()
            .submissions
            .iter()
            .filter(|(_, tid)| tid == token_id)
            .count()
    }

    pub fn is_ordered(&self, request_id: &RequestId) -> bool {
        self.state.lock().unwrap().proofs.contains_key(request_id)
    }

    /// Create an ordered genesis token owned by `state`.
    pub fn mint_token(
        &self,
        token_id: TokenId,
        token_type: TokenType,
        coins: CoinData,
        state: TokenState,
    ) -> Token {
        let commitment = MintCommitment::create(MintTransactionData {
            token_id,
            token_type,
            coins,
            recipient: state.address(),
            salt: Salt::ZERO,
            reason: MintReason::Genesis,
        });
        let proof = self.order(
            commitment.request_id,
            token_id,
            commitment.transaction_hash(),
        );
        let genesis = Transaction::from_commitment(&commitment, proof)
            .expect("a fresh proof binds to its commitment");
        Token::from_genesis(genesis, state).expect("genesis is minted to its own state")
    }

    /// Nametag token for `name`, owned by `state`.
    pub fn mint_nametag(&self, name: &str, token_type: TokenType, state: TokenState) -> Token {
        self.mint_token(nametag_token_id(name), token_type, CoinData::new(), state)
    }

    fn order(
        &self,
        request_id: RequestId,
        token_id: TokenId,
        transaction_hash: TransactionHash,
    ) -> InclusionProof {
        let mut state = self.state.lock().unwrap();
        state.round += 1;
        state.tokens.insert(request_id, token_id);
        let proof = InclusionProof::signed(request_id, transaction_hash, state.round, &self.key);
        state.proofs.insert(request_id, proof.clone());
        proof
    }

    fn submit<D: TransactionData>(
        &self,
        commitment: &Commitment<D>,
    ) -> Result<SubmitStatus, LedgerError> {
        let request_id = commitment.request_id;
        {
            let mut state = self.state.lock().unwrap();
            if state.offline {
                return Err(LedgerError::Transport("null ledger offline".into()));
            }
            state.submissions.push((request_id, commitment.token_id()));
            if state.failing_tokens.contains(&commitment.token_id()) {
                return Err(LedgerError::Transport(format!(
                    "null ledger: submissions for {} fail",
                    commitment.token_id()
                )));
            }
            if let Some(status) = state.reject_requests.get(&request_id) {
                return Ok(status.clone());
            }
            if let Some(status) = state.reject_tokens.get(&commitment.token_id()) {
                return Ok(status.clone());
            }
            if state.proofs.contains_key(&request_id) {
                return Ok(SubmitStatus::RequestIdExists);
            }
        }
        if commitment.verify().is_err() {
            return Ok(SubmitStatus::AuthenticatorVerificationFailed);
        }
        self.order(
            request_id,
            commitment.token_id(),
            commitment.transaction_hash(),
        );
        Ok(SubmitStatus::Success)
    }
}

impl Default for NullLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerClient for NullLedger {
    async fn submit_mint(&self, commitment: &MintCommitment) -> Result<SubmitStatus, LedgerError> {
        self.submit(commitment)
    }

    async fn submit_transfer(
        &self,
        commitment: &TransferCommitment,
    ) -> Result<SubmitStatus, LedgerError> {
        self.submit(commitment)
    }

    async fn get_inclusion_proof(
        &self,
        request_id: &RequestId,
    ) -> Result<Option<InclusionProof>, LedgerError> {
        let state = self.state.lock().unwrap();
        if state.offline {
            return Err(LedgerError::Transport("null ledger offline".into()));
        }
        let token_withheld = state
            .tokens
            .get(request_id)
            .is_some_and(|t| state.withheld_tokens.contains(t));
        if state.withhold_all || token_withheld || state.withheld.contains(request_id) {
            return Ok(None);
        }
        Ok(state.proofs.get(request_id).cloned())
    }
}
