//! Pre-built [`tracing::Span`] constructors for the split roles.
//!
//! Consistent span names and fields make one split traceable across the
//! executor, the background task, the recipient and later recovery runs.

use tracing::{info_span, Span};

use crate::records::SplitGroupId;

/// Critical path of one split on the sender side.
pub fn split_execute_span(split_group_id: &SplitGroupId) -> Span {
    info_span!("split_execute", split_group_id = %split_group_id)
}

/// Deferred mint/transfer submission and change-token reconstruction.
pub fn split_background_span(split_group_id: &SplitGroupId) -> Span {
    info_span!("split_background", split_group_id = %split_group_id)
}

/// Recipient-side processing of one bundle.
pub fn split_process_span(split_group_id: &SplitGroupId, version: &str) -> Span {
    info_span!("split_process", split_group_id = %split_group_id, version = %version)
}

/// One recovery pass over persisted outbox records.
pub fn split_recovery_span(candidates: usize) -> Span {
    info_span!("split_recovery", candidates = candidates)
}

/// A single inclusion-proof wait.
pub fn proof_wait_span(stage: &str, request_id: &str) -> Span {
    info_span!("proof_wait", stage = %stage, request_id = %request_id)
}
