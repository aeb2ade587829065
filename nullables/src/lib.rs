//! Nullable infrastructure for deterministic testing.
//!
//! Every external dependency of the split engine (ledger, transport, clock,
//! randomness, seed hashing, host callbacks) sits behind a trait. This crate
//! provides in-memory implementations that:
//! - Return deterministic values
//! - Can be steered programmatically (rejections, withheld proofs, failures)
//! - Record what the engine did for assertions
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod callbacks;
pub mod clock;
pub mod hasher;
pub mod ledger;
pub mod random;
pub mod transport;

pub use callbacks::{NullNametagResolver, RecordingCallbacks};
pub use clock::NullClock;
pub use hasher::NullHasher;
pub use ledger::NullLedger;
pub use random::NullRandom;
pub use transport::NullTransport;
