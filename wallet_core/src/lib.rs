//! Instant split engine for Splitline wallets.
//!
//! Splits one fungible token into a transferred piece and a change piece
//! while keeping the user-visible latency to a single proof wait:
//! - **Planner**: derives both token identities and all salts from one seed
//! - **Executor** (sender): burn, burn proof, deliver the bundle
//! - **Background reconciler**: submits the deferred mints and transfer and
//!   rebuilds the change token after the caller already has its answer
//! - **Processor** (recipient): replays and verifies a received bundle
//! - **Recovery**: finishes splits whose background phase was interrupted

pub mod bundle;
pub mod callbacks;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod identity;
pub mod planner;
pub mod processor;
pub mod proof_wait;
pub mod reconciler;
pub mod records;
pub mod recovery;
pub mod tracing_spans;
mod wire;

pub use bundle::{BundleBody, BundleV4, BundleV5, SplitBundle, SplitOutput};
pub use callbacks::{CallbackError, NametagResolver, NoopCallbacks, SplitCallbacks};
pub use config::{ConfigError, SplitConfig};
pub use context::SplitContext;
pub use error::{SplitError, SplitStage, SplitWarning};
pub use executor::{SplitDelivery, SplitExecutor, SplitFailure, SplitRequest};
pub use identity::SigningIdentity;
pub use planner::{validate_amounts, SplitOutputs, SplitPlan, SplitPlanner};
pub use processor::{ProcessFailure, ReceivedSplit, SplitProcessor};
pub use proof_wait::{ProofWaitPolicy, ProofWaiter};
pub use reconciler::{
    BackgroundJob, BackgroundOutcome, BackgroundReconciler, BackgroundStage, BackgroundTask,
    SubmissionReport,
};
pub use records::{OutboxRecord, OutboxStatus, RecoveryMetadata, RecoveryStatus, SplitGroupId};
pub use recovery::{RecoveryErrorEntry, RecoveryReport, RecoveryService};
