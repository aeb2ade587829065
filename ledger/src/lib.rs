//! Ledger access for the split engine.
//!
//! The ledger orders commitments and hands back inclusion proofs. Everything
//! the engine needs from it goes through [`LedgerClient`]; [`RpcLedgerClient`]
//! talks to an aggregator node over JSON-RPC.

pub mod client;
pub mod error;
pub mod rpc;
pub mod status;

pub use client::LedgerClient;
pub use error::LedgerError;
pub use rpc::RpcLedgerClient;
pub use status::SubmitStatus;
