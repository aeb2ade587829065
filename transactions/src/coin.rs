//! Fungible coin balances carried by a token.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use splitline_types::CoinId;
use std::collections::BTreeMap;

/// Coin balances keyed by coin id. Amounts are raw integer units.
///
/// Serialized as `[["<coin id hex>", "<amount>"], ...]`; amounts travel as
/// decimal strings so 128-bit values survive JSON consumers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoinData(BTreeMap<CoinId, u128>);

impl CoinData {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn single(coin_id: CoinId, amount: u128) -> Self {
        let mut coins = Self::new();
        coins.insert(coin_id, amount);
        coins
    }

    pub fn insert(&mut self, coin_id: CoinId, amount: u128) {
        self.0.insert(coin_id, amount);
    }

    /// Balance of `coin_id`, zero if absent.
    pub fn amount_of(&self, coin_id: &CoinId) -> u128 {
        self.0.get(coin_id).copied().unwrap_or(0)
    }

    pub fn contains(&self, coin_id: &CoinId) -> bool {
        self.0.contains_key(coin_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CoinId, &u128)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy of these balances without `coin_id`.
    pub fn without(&self, coin_id: &CoinId) -> Self {
        let mut rest = self.0.clone();
        rest.remove(coin_id);
        Self(rest)
    }

    /// Canonical bytes for hashing (sorted by coin id).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.0.len() * 48);
        for (coin_id, amount) in &self.0 {
            out.extend_from_slice(coin_id.as_bytes());
            out.extend_from_slice(&amount.to_be_bytes());
        }
        out
    }
}

impl Serialize for CoinData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let pairs: Vec<(CoinId, String)> = self
            .0
            .iter()
            .map(|(id, amount)| (*id, amount.to_string()))
            .collect();
        pairs.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CoinData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pairs: Vec<(CoinId, String)> = Vec::deserialize(deserializer)?;
        let mut coins = BTreeMap::new();
        for (id, amount) in pairs {
            let amount: u128 = amount.parse().map_err(serde::de::Error::custom)?;
            if coins.insert(id, amount).is_some() {
                return Err(serde::de::Error::custom(format!("duplicate coin id {id}")));
            }
        }
        Ok(Self(coins))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_of_missing_coin_is_zero() {
        let coins = CoinData::single(CoinId::new([1; 32]), 500);
        assert_eq!(coins.amount_of(&CoinId::new([2; 32])), 0);
        assert_eq!(coins.amount_of(&CoinId::new([1; 32])), 500);
    }

    #[test]
    fn json_keeps_u128_precision() {
        let coins = CoinData::single(CoinId::new([1; 32]), u128::MAX);
        let json = serde_json::to_string(&coins).unwrap();
        let back: CoinData = serde_json::from_str(&json).unwrap();
        assert_eq!(back.amount_of(&CoinId::new([1; 32])), u128::MAX);
    }

    #[test]
    fn duplicate_coin_rejected() {
        let id = CoinId::new([1; 32]).to_hex();
        let json = format!(r#"[["{id}","1"],["{id}","2"]]"#);
        assert!(serde_json::from_str::<CoinData>(&json).is_err());
    }

    #[test]
    fn without_drops_only_that_coin() {
        let mut coins = CoinData::single(CoinId::new([1; 32]), 10);
        coins.insert(CoinId::new([2; 32]), 20);
        let rest = coins.without(&CoinId::new([1; 32]));
        assert!(!rest.contains(&CoinId::new([1; 32])));
        assert_eq!(rest.amount_of(&CoinId::new([2; 32])), 20);
    }
}
