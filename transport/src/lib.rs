//! Peer-to-peer delivery of split bundles.
//!
//! The engine only needs one primitive from the messaging layer: hand an
//! opaque payload to a recipient identified by public key and get back an
//! id for the delivered event.

pub mod error;
pub mod message;

pub use error::TransportError;
pub use message::{DeliveryId, DeliveryMessage};

use async_trait::async_trait;
use splitline_types::PublicKey;

#[async_trait]
pub trait Transport: Send + Sync {
    async fn deliver(
        &self,
        recipient: &PublicKey,
        message: DeliveryMessage,
    ) -> Result<DeliveryId, TransportError>;
}
