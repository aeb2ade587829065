//! Nullable transport: record deliveries without sending them.

use async_trait::async_trait;
use splitline_transport::{DeliveryId, DeliveryMessage, Transport, TransportError};
use splitline_types::PublicKey;
use std::sync::Mutex;

#[derive(Default)]
struct TransportState {
    delivered: Vec<(PublicKey, DeliveryMessage)>,
    unreachable: bool,
}

/// A transport that records messages instead of sending them.
#[derive(Default)]
pub struct NullTransport {
    state: Mutex<TransportState>,
}

impl NullTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every delivery with [`TransportError::Unreachable`].
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().unwrap().unreachable = unreachable;
    }

    /// All delivered messages with their recipients (for assertions).
    pub fn deliveries(&self) -> Vec<(PublicKey, DeliveryMessage)> {
        self.state.lock().unwrap().delivered.clone()
    }

    /// Payload of the most recent delivery.
    pub fn last_payload(&self) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .delivered
            .last()
            .map(|(_, m)| m.payload.clone())
    }
}

#[async_trait]
impl Transport for NullTransport {
    async fn deliver(
        &self,
        recipient: &PublicKey,
        message: DeliveryMessage,
    ) -> Result<DeliveryId, TransportError> {
        let mut state = self.state.lock().unwrap();
        if state.unreachable {
            return Err(TransportError::Unreachable(format!("{recipient} (null transport)")));
        }
        state.delivered.push((recipient.clone(), message));
        Ok(DeliveryId(format!("null-delivery-{}", state.delivered.len())))
    }
}
