//! Delivery message and receipt types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Payload handed to the transport. `memo` is a short human-readable note
/// shown by clients that display raw deliveries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryMessage {
    pub payload: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

impl DeliveryMessage {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            memo: None,
        }
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }
}

/// Transport-assigned id of a delivered message (e.g. an event id).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliveryId(pub String);

impl fmt::Display for DeliveryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memo_is_optional_on_the_wire() {
        let msg = DeliveryMessage::new("{}");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("memo"));
        let with = DeliveryMessage::new("{}").with_memo("split");
        assert_eq!(with.memo.as_deref(), Some("split"));
    }

    #[test]
    fn delivery_id_is_a_bare_string() {
        let id = DeliveryId("evt-1".into());
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"evt-1\"");
    }
}
