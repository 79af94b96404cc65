//! Deferred finalization handle returned with every submission

use super::traits::BroadcastResponse;
use crate::error::SubmitterResult;

use ethers::types::{TransactionReceipt, H256, U64};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FinalizationStatus {
    Success,
    Failed,
}

/// Terminal on-chain outcome of a submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinalizationResult {
    pub transaction_hash: Option<H256>,
    pub block_number: Option<u64>,
    pub status: FinalizationStatus,
}

impl FinalizationResult {
    /// Map a receipt (or its absence) to a result; status 1 is success
    pub fn from_receipt(transaction_hash: H256, receipt: Option<&TransactionReceipt>) -> Self {
        let status = match receipt.and_then(|r| r.status) {
            Some(status) if status == U64::one() => FinalizationStatus::Success,
            _ => FinalizationStatus::Failed,
        };

        Self {
            transaction_hash: Some(transaction_hash),
            block_number: receipt.and_then(|r| r.block_number).map(|b| b.as_u64()),
            status,
        }
    }
}

#[derive(Clone)]
enum Waiter {
    Simulated,
    Broadcast {
        transaction_hash: H256,
        response: Arc<dyn BroadcastResponse>,
    },
}

/// Waits for a submission to reach a terminal state.
///
/// Each call awaits the broadcast response again; memoization, if any, is the
/// response's business.
#[derive(Clone)]
pub struct FinalizationWaiter {
    inner: Waiter,
}

impl FinalizationWaiter {
    pub fn new(transaction_hash: H256, response: Arc<dyn BroadcastResponse>) -> Self {
        Self {
            inner: Waiter::Broadcast {
                transaction_hash,
                response,
            },
        }
    }

    /// Waiter for a dry-run; resolves immediately to success
    pub fn simulated() -> Self {
        Self {
            inner: Waiter::Simulated,
        }
    }

    pub async fn wait(&self) -> SubmitterResult<FinalizationResult> {
        match &self.inner {
            Waiter::Simulated => Ok(FinalizationResult {
                transaction_hash: None,
                block_number: None,
                status: FinalizationStatus::Success,
            }),
            Waiter::Broadcast {
                transaction_hash,
                response,
            } => {
                let receipt = response.wait().await?;
                let result = FinalizationResult::from_receipt(*transaction_hash, receipt.as_ref());

                debug!(
                    "Transaction {:?} finalized in block {:?}: {:?}",
                    transaction_hash, result.block_number, result.status
                );
                crate::metrics::record_finalization(result.status);

                Ok(result)
            }
        }
    }
}
