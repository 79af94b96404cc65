//! Wallet transaction submitter
//!
//! Submits a single wallet-signed EVM transaction: resolves gas limit and
//! price concurrently with an optional caller pre-check, falls back to fixed
//! values on chains that need them, broadcasts through the caller's signer,
//! reports lifecycle events, and hands back a handle to await finalization.
//! A simulation backend can replace the broadcast entirely.

pub mod chain;
pub mod config;
pub mod error;
pub mod metrics;
pub mod tx;

pub use error::{SubmitterError, SubmitterResult};
pub use tx::{SubmissionResult, TransactionSubmitter, WalletTransaction};
