//! Deterministic split planning.
//!
//! Everything a split creates (two token ids and four salts) is derived from
//! one seed string, so sender, recipient and a later recovery run all
//! regenerate the same material without exchanging it.

use serde::{Deserialize, Serialize};
use splitline_crypto::SplitHasher;
use splitline_token::Token;
use splitline_transactions::CoinData;
use splitline_types::{CoinId, Salt, Timestamp, TokenId};
use std::sync::Arc;

use crate::error::SplitError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitPlan {
    pub seed: String,
    pub original_token_id: TokenId,
    pub recipient_token_id: TokenId,
    pub sender_token_id: TokenId,
    pub recipient_salt: Salt,
    pub sender_salt: Salt,
    pub transfer_salt: Salt,
    pub burn_salt: Salt,
    pub coin_id: CoinId,
    #[serde(with = "crate::wire::u128_string")]
    pub split_amount: u128,
    #[serde(with = "crate::wire::u128_string")]
    pub change_amount: u128,
}

/// Coin balances of the two split outputs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitOutputs {
    pub recipient: CoinData,
    /// The change amount plus every other coin the token carried.
    pub change: CoinData,
}

#[derive(Clone)]
pub struct SplitPlanner {
    hasher: Arc<dyn SplitHasher>,
}

impl SplitPlanner {
    pub fn new(hasher: Arc<dyn SplitHasher>) -> Self {
        Self { hasher }
    }

    /// `<tokenIdHex>_<split>_<change>_<timestampMs>`
    pub fn seed(
        token_id: &TokenId,
        split_amount: u128,
        change_amount: u128,
        timestamp: Timestamp,
    ) -> String {
        format!(
            "{}_{}_{}_{}",
            token_id.to_hex(),
            split_amount,
            change_amount,
            timestamp.as_millis()
        )
    }

    /// Validate the amounts against `token` and derive a fresh plan.
    pub fn plan(
        &self,
        token: &Token,
        coin_id: CoinId,
        split_amount: u128,
        change_amount: u128,
        timestamp: Timestamp,
    ) -> Result<SplitPlan, SplitError> {
        validate_amounts(token.coins(), &coin_id, split_amount, change_amount)?;
        let seed = Self::seed(&token.id(), split_amount, change_amount, timestamp);
        Ok(self.derive(token.id(), coin_id, split_amount, change_amount, &seed))
    }

    /// Derive the plan for `seed` without validation.
    pub fn derive(
        &self,
        original_token_id: TokenId,
        coin_id: CoinId,
        split_amount: u128,
        change_amount: u128,
        seed: &str,
    ) -> SplitPlan {
        let h = |suffix: &str| self.hasher.hash(format!("{seed}{suffix}").as_bytes());
        SplitPlan {
            seed: seed.to_string(),
            original_token_id,
            recipient_token_id: TokenId::new(h("")),
            sender_token_id: TokenId::new(h("_sender")),
            recipient_salt: Salt::new(h("_recipient_salt")),
            sender_salt: Salt::new(h("_sender_salt")),
            transfer_salt: Salt::new(h("_transfer_salt")),
            burn_salt: Salt::new(h("_burn_salt")),
            coin_id,
            split_amount,
            change_amount,
        }
    }

    pub fn hasher_name(&self) -> &str {
        self.hasher.name()
    }
}

impl SplitPlan {
    pub fn outputs(&self, source: &CoinData) -> SplitOutputs {
        let mut change = source.without(&self.coin_id);
        change.insert(self.coin_id, self.change_amount);
        SplitOutputs {
            recipient: CoinData::single(self.coin_id, self.split_amount),
            change,
        }
    }
}

/// Both amounts positive, coin present, and their sum equal to its balance.
pub fn validate_amounts(
    coins: &CoinData,
    coin_id: &CoinId,
    split_amount: u128,
    change_amount: u128,
) -> Result<(), SplitError> {
    if split_amount == 0 || change_amount == 0 {
        return Err(SplitError::InvalidAmounts(format!(
            "split ({split_amount}) and change ({change_amount}) must both be positive"
        )));
    }
    if !coins.contains(coin_id) {
        return Err(SplitError::InvalidAmounts(format!(
            "token holds no coin {coin_id}"
        )));
    }
    let available = coins.amount_of(coin_id);
    match split_amount.checked_add(change_amount) {
        Some(total) if total == available => Ok(()),
        _ => Err(SplitError::InvalidAmounts(format!(
            "split ({split_amount}) + change ({change_amount}) != balance ({available})"
        ))),
    }
}
