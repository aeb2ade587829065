//! Shared collaborators of the split roles.

use splitline_crypto::{OsRandom, RandomSource, Sha256SplitHasher, SplitHasher};
use splitline_ledger::LedgerClient;
use splitline_transactions::TrustBase;
use splitline_types::{Clock, SystemClock};
use std::sync::Arc;

use crate::callbacks::{NoopCallbacks, SplitCallbacks};
use crate::config::SplitConfig;
use crate::identity::SigningIdentity;
use crate::planner::SplitPlanner;
use crate::proof_wait::ProofWaiter;

/// Everything the executor, processor, reconciler and recovery service
/// share. Cheap to clone; all members are reference counted.
#[derive(Clone)]
pub struct SplitContext {
    pub ledger: Arc<dyn LedgerClient>,
    pub trust_base: Arc<TrustBase>,
    pub identity: Arc<SigningIdentity>,
    pub config: Arc<SplitConfig>,
    pub callbacks: Arc<dyn SplitCallbacks>,
    pub hasher: Arc<dyn SplitHasher>,
    pub random: Arc<dyn RandomSource>,
    pub clock: Arc<dyn Clock>,
}

impl SplitContext {
    /// Context with no-op callbacks, SHA-256 seeds, OS randomness and the
    /// system clock.
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        trust_base: TrustBase,
        identity: SigningIdentity,
        config: SplitConfig,
    ) -> Self {
        Self {
            ledger,
            trust_base: Arc::new(trust_base),
            identity: Arc::new(identity),
            config: Arc::new(config),
            callbacks: Arc::new(NoopCallbacks),
            hasher: Arc::new(Sha256SplitHasher),
            random: Arc::new(OsRandom),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_callbacks(mut self, callbacks: Arc<dyn SplitCallbacks>) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn with_hasher(mut self, hasher: Arc<dyn SplitHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn dev_mode(&self) -> bool {
        self.config.dev_mode
    }

    pub fn planner(&self) -> SplitPlanner {
        SplitPlanner::new(self.hasher.clone())
    }

    pub fn proof_waiter(&self) -> ProofWaiter {
        ProofWaiter::new(
            self.ledger.clone(),
            self.config.proof_wait_policy(),
            self.config.poll_interval(),
        )
    }
}
