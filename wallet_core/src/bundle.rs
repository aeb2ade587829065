//! Split bundle wire format.
//!
//! A bundle is everything a recipient needs to finish a split without
//! talking to the sender again. The JSON envelope carries a `version` tag
//! that selects the layout; [`SplitBundle::from_json`] reads it first and
//! rejects anything it does not know.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use splitline_token::Token;
use splitline_transactions::{
    Address, CoinData, MintTransactionData, TokenState, TransferCommitment, TransferTransaction,
};
use splitline_types::{CoinId, PublicKey, Salt, TokenId, TokenType};

use crate::error::SplitError;
use crate::records::SplitGroupId;
use crate::wire::{json_string, json_string_opt, u128_string};

pub const BUNDLE_TYPE: &str = "INSTANT_SPLIT";
pub const VERSION_V4: &str = "4.0";
pub const VERSION_V5: &str = "5.0";

/// A split output the recipient does not receive, as committed in the burn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitOutput {
    #[serde(rename = "tokenIdHex")]
    pub token_id: TokenId,
    pub coins: CoinData,
}

/// Fields shared by every bundle version.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleBody {
    /// Recipient piece's mint, not yet submitted by the sender.
    pub recipient_mint_data: MintTransactionData,
    /// Transfer of the recipient piece, built before its mint was proven.
    pub transfer_commitment: TransferCommitment,
    /// The sender's change piece. Together with the recipient mint it must
    /// reproduce the outputs hash the burn commits to.
    pub change_output: SplitOutput,
    #[serde(with = "u128_string")]
    pub amount: u128,
    pub coin_id: CoinId,
    #[serde(rename = "tokenTypeHex")]
    pub token_type: TokenType,
    pub split_group_id: SplitGroupId,
    pub sender_pubkey: PublicKey,
    #[serde(rename = "recipientSaltHex")]
    pub recipient_salt: Salt,
    #[serde(rename = "transferSaltHex")]
    pub transfer_salt: Salt,
    /// State the sender minted the recipient piece to.
    #[serde(rename = "mintedTokenStateJson", with = "json_string")]
    pub minted_token_state: TokenState,
    #[serde(rename = "recipientAddressJson", with = "json_string")]
    pub recipient_address: Address,
    #[serde(
        rename = "nametagTokenJson",
        default,
        with = "json_string_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub nametag_token: Option<Token>,
}

/// Production bundle: the burn arrives already proven.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleV5 {
    pub burn_transaction: TransferTransaction,
    #[serde(flatten)]
    pub body: BundleBody,
}

/// Dev-only legacy bundle: the recipient submits and proves the burn itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleV4 {
    pub burn_commitment: TransferCommitment,
    #[serde(flatten)]
    pub body: BundleBody,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SplitBundle {
    V4(BundleV4),
    V5(BundleV5),
}

impl SplitBundle {
    pub fn version(&self) -> &'static str {
        match self {
            Self::V4(_) => VERSION_V4,
            Self::V5(_) => VERSION_V5,
        }
    }

    pub fn body(&self) -> &BundleBody {
        match self {
            Self::V4(b) => &b.body,
            Self::V5(b) => &b.body,
        }
    }

    pub fn split_group_id(&self) -> SplitGroupId {
        self.body().split_group_id
    }

    pub fn to_json(&self) -> Result<String, SplitError> {
        let mut value = match self {
            Self::V4(b) => serde_json::to_value(b)?,
            Self::V5(b) => serde_json::to_value(b)?,
        };
        let object = value
            .as_object_mut()
            .ok_or_else(|| SplitError::InvalidBundle("bundle did not serialize to an object".into()))?;
        object.insert("version".into(), Value::from(self.version()));
        object.insert("type".into(), Value::from(BUNDLE_TYPE));
        Ok(serde_json::to_string(&value)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SplitError> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| SplitError::InvalidBundle(format!("not JSON: {e}")))?;
        let version = value
            .get("version")
            .and_then(Value::as_str)
            .ok_or_else(|| SplitError::InvalidBundle("missing version".into()))?
            .to_string();
        if version != VERSION_V4 && version != VERSION_V5 {
            return Err(SplitError::UnsupportedBundleVersion(version));
        }
        match value.get("type").and_then(Value::as_str) {
            Some(BUNDLE_TYPE) => {}
            other => {
                return Err(SplitError::InvalidBundle(format!(
                    "expected type {BUNDLE_TYPE}, got {other:?}"
                )))
            }
        }
        let parse_err = |e: serde_json::Error| SplitError::InvalidBundle(format!("v{version}: {e}"));
        if version == VERSION_V5 {
            serde_json::from_value(value).map(Self::V5).map_err(parse_err)
        } else {
            serde_json::from_value(value).map(Self::V4).map_err(parse_err)
        }
    }
}
