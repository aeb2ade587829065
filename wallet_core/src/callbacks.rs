//! Host application hooks.
//!
//! The engine reports progress and hands over tokens through
//! [`SplitCallbacks`]. Every method has a no-op default, so hosts implement
//! only what they persist or display. Callback failures never fail a split:
//! they come back as warnings.

use async_trait::async_trait;
use splitline_token::Token;
use splitline_transport::DeliveryId;
use splitline_types::TokenId;
use thiserror::Error;

use crate::reconciler::BackgroundStage;
use crate::records::{RecoveryMetadata, SplitGroupId};

#[derive(Debug, Error)]
#[error("callback failed: {0}")]
pub struct CallbackError(pub String);

impl CallbackError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[async_trait]
pub trait SplitCallbacks: Send + Sync {
    /// The burn of the source token is proven. Receives the serialized
    /// burn transaction.
    async fn on_burn_completed(
        &self,
        _split_group_id: &SplitGroupId,
        _burn_json: &str,
    ) -> Result<(), CallbackError> {
        Ok(())
    }

    /// The bundle reached the transport.
    async fn on_delivered(
        &self,
        _split_group_id: &SplitGroupId,
        _delivery_id: &DeliveryId,
    ) -> Result<(), CallbackError> {
        Ok(())
    }

    async fn on_background_progress(&self, _split_group_id: &SplitGroupId, _stage: BackgroundStage) {}

    /// A reconstructed change token, typically persisted by the host.
    async fn on_change_token_created(&self, _token: &Token) -> Result<(), CallbackError> {
        Ok(())
    }

    /// Push local storage to its remote; `Ok(true)` when a sync happened.
    async fn on_storage_sync(&self) -> Result<bool, CallbackError> {
        Ok(false)
    }

    /// Store or replace the recovery record of a split.
    async fn persist_recovery_metadata(
        &self,
        _metadata: &RecoveryMetadata,
    ) -> Result<(), CallbackError> {
        Ok(())
    }

    /// Whether the host already holds `token_id`.
    async fn has_token(&self, _token_id: &TokenId) -> Result<bool, CallbackError> {
        Ok(false)
    }
}

/// Callbacks that do nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopCallbacks;

impl SplitCallbacks for NoopCallbacks {}

/// Looks up nametag tokens for proxy addresses the bundle did not cover.
#[async_trait]
pub trait NametagResolver: Send + Sync {
    async fn resolve(&self, nametag_id: &TokenId) -> Result<Option<Token>, CallbackError>;
}
