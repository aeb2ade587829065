//! Recording host callbacks and a static nametag resolver.

use async_trait::async_trait;
use splitline_token::Token;
use splitline_transport::DeliveryId;
use splitline_types::TokenId;
use splitline_wallet_core::{
    BackgroundStage, CallbackError, NametagResolver, RecoveryMetadata, SplitCallbacks,
    SplitGroupId,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
struct Recorded {
    burns: Vec<(SplitGroupId, String)>,
    deliveries: Vec<(SplitGroupId, DeliveryId)>,
    progress: Vec<(SplitGroupId, BackgroundStage)>,
    change_tokens: Vec<Token>,
    metadata: Vec<RecoveryMetadata>,
    sync_calls: usize,
    held: HashSet<TokenId>,
    fail_change_token: bool,
    fail_persist: bool,
    fail_sync: bool,
    sync_result: bool,
}

/// Host callbacks that remember every call.
///
/// Accepted change tokens are added to the held set, so a later
/// `has_token` for the same id answers `true` like a real token store.
#[derive(Default)]
pub struct RecordingCallbacks {
    state: Mutex<Recorded>,
}

impl RecordingCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_change_token(&self, fail: bool) {
        self.state.lock().unwrap().fail_change_token = fail;
    }

    pub fn fail_persist(&self, fail: bool) {
        self.state.lock().unwrap().fail_persist = fail;
    }

    pub fn fail_sync(&self, fail: bool) {
        self.state.lock().unwrap().fail_sync = fail;
    }

    /// What `on_storage_sync` answers when it does not fail.
    pub fn set_sync_result(&self, synced: bool) {
        self.state.lock().unwrap().sync_result = synced;
    }

    /// Pretend the host already stores `token_id`.
    pub fn hold_token(&self, token_id: TokenId) {
        self.state.lock().unwrap().held.insert(token_id);
    }

    pub fn burns(&self) -> Vec<(SplitGroupId, String)> {
        self.state.lock().unwrap().burns.clone()
    }

    pub fn deliveries(&self) -> Vec<(SplitGroupId, DeliveryId)> {
        self.state.lock().unwrap().deliveries.clone()
    }

    /// Stages reported for `split_group_id`, in order.
    pub fn progress(&self, split_group_id: &SplitGroupId) -> Vec<BackgroundStage> {
        self.state
            .lock()
            .unwrap()
            .progress
            .iter()
            .filter(|(id, _)| id == split_group_id)
            .map(|(_, stage)| *stage)
            .collect()
    }

    pub fn change_tokens(&self) -> Vec<Token> {
        self.state.lock().unwrap().change_tokens.clone()
    }

    /// Every persisted metadata record, oldest first.
    pub fn metadata(&self) -> Vec<RecoveryMetadata> {
        self.state.lock().unwrap().metadata.clone()
    }

    pub fn latest_metadata(&self, split_group_id: &SplitGroupId) -> Option<RecoveryMetadata> {
        self.state
            .lock()
            .unwrap()
            .metadata
            .iter()
            .rev()
            .find(|m| &m.split_group_id == split_group_id)
            .cloned()
    }

    pub fn sync_calls(&self) -> usize {
        self.state.lock().unwrap().sync_calls
    }
}

#[async_trait]
impl SplitCallbacks for RecordingCallbacks {
    async fn on_burn_completed(
        &self,
        split_group_id: &SplitGroupId,
        burn_json: &str,
    ) -> Result<(), CallbackError> {
        self.state
            .lock()
            .unwrap()
            .burns
            .push((*split_group_id, burn_json.to_string()));
        Ok(())
    }

    async fn on_delivered(
        &self,
        split_group_id: &SplitGroupId,
        delivery_id: &DeliveryId,
    ) -> Result<(), CallbackError> {
        self.state
            .lock()
            .unwrap()
            .deliveries
            .push((*split_group_id, delivery_id.clone()));
        Ok(())
    }

    async fn on_background_progress(&self, split_group_id: &SplitGroupId, stage: BackgroundStage) {
        self.state
            .lock()
            .unwrap()
            .progress
            .push((*split_group_id, stage));
    }

    async fn on_change_token_created(&self, token: &Token) -> Result<(), CallbackError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_change_token {
            return Err(CallbackError::new("token store unavailable"));
        }
        state.held.insert(token.id());
        state.change_tokens.push(token.clone());
        Ok(())
    }

    async fn on_storage_sync(&self) -> Result<bool, CallbackError> {
        let mut state = self.state.lock().unwrap();
        state.sync_calls += 1;
        if state.fail_sync {
            return Err(CallbackError::new("remote storage unreachable"));
        }
        Ok(state.sync_result)
    }

    async fn persist_recovery_metadata(
        &self,
        metadata: &RecoveryMetadata,
    ) -> Result<(), CallbackError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_persist {
            return Err(CallbackError::new("outbox store unavailable"));
        }
        state.metadata.push(metadata.clone());
        Ok(())
    }

    async fn has_token(&self, token_id: &TokenId) -> Result<bool, CallbackError> {
        Ok(self.state.lock().unwrap().held.contains(token_id))
    }
}

/// Resolves nametags from a fixed set.
#[derive(Default)]
pub struct NullNametagResolver {
    nametags: HashMap<TokenId, Token>,
}

impl NullNametagResolver {
    pub fn new(nametags: impl IntoIterator<Item = Token>) -> Self {
        Self {
            nametags: nametags.into_iter().map(|t| (t.id(), t)).collect(),
        }
    }
}

#[async_trait]
impl NametagResolver for NullNametagResolver {
    async fn resolve(&self, nametag_id: &TokenId) -> Result<Option<Token>, CallbackError> {
        Ok(self.nametags.get(nametag_id).cloned())
    }
}
