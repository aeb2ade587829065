//! Split correlation ids and the intent records persisted for recovery.

use serde::{Deserialize, Serialize};
use splitline_crypto::RandomSource;
use splitline_transactions::{CoinData, MintCommitment};
use splitline_types::{CoinId, Salt, Timestamp, TokenId, TokenType};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::wire::u128_string;

/// Correlates every commitment and artifact of one split.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SplitGroupId(Uuid);

impl SplitGroupId {
    /// Random v4 UUID drawn from `random`.
    pub fn generate(random: &dyn RandomSource) -> Self {
        Self(uuid::Builder::from_random_bytes(random.random_16()).into_uuid())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for SplitGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SplitGroupId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecoveryStatus {
    /// Burn about to be submitted; nothing delivered yet.
    Started,
    /// Burn accepted and bundle built (`bundle_json` set); delivery not
    /// confirmed. The source token is gone from here on.
    BundleReady,
    /// Bundle delivered; background work pending.
    Delivered,
    /// Change token reconstructed and handed to the host.
    Completed,
    Failed,
}

/// What the executor persists so an interrupted split can be finished.
///
/// Besides the seed material it carries the full sender mint commitment, so
/// recovery never depends on transaction bodies that were only in memory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryMetadata {
    pub split_group_id: SplitGroupId,
    pub status: RecoveryStatus,
    pub version: String,
    #[serde(rename = "senderTokenIdHex")]
    pub sender_token_id: TokenId,
    #[serde(rename = "senderSaltHex")]
    pub sender_salt: Salt,
    #[serde(with = "u128_string")]
    pub change_amount: u128,
    #[serde(with = "u128_string")]
    pub split_amount: u128,
    pub seed_string: String,
    #[serde(rename = "originalTokenIdHex")]
    pub original_token_id: TokenId,
    pub coin_id: CoinId,
    #[serde(rename = "tokenTypeHex")]
    pub token_type: TokenType,
    pub change_coins: CoinData,
    pub sender_mint_commitment: MintCommitment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_json: Option<String>,
    pub updated_at: Timestamp,
}

impl RecoveryMetadata {
    pub fn with_status(&self, status: RecoveryStatus, now: Timestamp) -> Self {
        Self {
            status,
            updated_at: now,
            ..self.clone()
        }
    }
}

/// Host-side delivery status of an outbox entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboxStatus {
    Pending,
    Sent,
    Completed,
    Failed,
}

/// One record of the host's persisted outbox, as fed to recovery.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboxRecord {
    pub id: String,
    pub split_group_id: SplitGroupId,
    pub status: OutboxStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<RecoveryMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_json: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use splitline_crypto::OsRandom;

    #[test]
    fn group_id_is_v4_and_parses_back() {
        let id = SplitGroupId::generate(&OsRandom);
        assert_eq!(id.as_uuid().get_version_num(), 4);
        let parsed: SplitGroupId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn outbox_record_without_metadata_parses() {
        let json = r#"{
            "id": "outbox-1",
            "splitGroupId": "6f1c2a4e-8a2b-4c3d-9e5f-0a1b2c3d4e5f",
            "status": "SENT"
        }"#;
        let record: OutboxRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.status, OutboxStatus::Sent);
        assert!(record.metadata.is_none());
    }

    #[test]
    fn recovery_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&RecoveryStatus::BundleReady).unwrap(),
            "\"BUNDLE_READY\""
        );
    }
}
