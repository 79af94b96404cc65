//! Submission request and result types

use super::events::EventCallback;
use super::finality::{FinalizationResult, FinalizationWaiter};
use super::traits::WalletSigner;
use crate::error::SubmitterResult;

use ethers::types::{Address, Bytes, H256, U256};
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

/// Gas price types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasPrice {
    Legacy(U256),
    Eip1559 {
        max_fee_per_gas: U256,
        max_priority_fee_per_gas: U256,
    },
}

impl GasPrice {
    /// Highest price per gas unit the transaction may pay
    pub fn max_fee_per_gas(&self) -> U256 {
        match self {
            GasPrice::Legacy(price) => *price,
            GasPrice::Eip1559 {
                max_fee_per_gas, ..
            } => *max_fee_per_gas,
        }
    }
}

/// Caller-supplied check run concurrently with gas resolution.
/// An error aborts the submission before anything is signed.
pub type PreSubmissionHook = Box<dyn FnOnce() -> BoxFuture<'static, SubmitterResult<()>> + Send>;

/// Input handed to the gas estimator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasEstimateRequest {
    pub to: Address,
    pub from: Address,
    pub data: Bytes,
    pub value: Option<U256>,
}

/// Fully resolved request handed to the signer for broadcast
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletTransactionRequest {
    pub to: Address,
    pub data: Bytes,
    pub value: Option<U256>,
    pub from: Address,
    pub nonce: Option<u64>,
    pub gas_limit: Option<U256>,
    /// Same value as `gas_limit`; some signers only read this name
    pub gas: Option<U256>,
    /// Extra fee field, set only on chains with a fallback profile
    pub base_gas: Option<U256>,
    pub gas_price: Option<GasPrice>,
}

/// A single wallet transaction to submit
pub struct WalletTransaction {
    pub chain_id: u64,
    pub signer: Arc<dyn WalletSigner>,
    pub to: Address,
    pub call_data: Bytes,
    pub value: Option<U256>,
    pub gas_limit: Option<U256>,
    pub gas_price: Option<GasPrice>,
    pub nonce: Option<U256>,
    pub memo: Option<String>,
    pub pre_submission_hook: Option<PreSubmissionHook>,
    pub callback: Option<EventCallback>,
}

impl WalletTransaction {
    pub fn new(
        chain_id: u64,
        signer: Arc<dyn WalletSigner>,
        to: Address,
        call_data: impl Into<Bytes>,
    ) -> Self {
        Self {
            chain_id,
            signer,
            to,
            call_data: call_data.into(),
            value: None,
            gas_limit: None,
            gas_price: None,
            nonce: None,
            memo: None,
            pre_submission_hook: None,
            callback: None,
        }
    }

    pub fn value(mut self, value: impl Into<U256>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn gas_limit(mut self, gas_limit: impl Into<U256>) -> Self {
        self.gas_limit = Some(gas_limit.into());
        self
    }

    pub fn gas_price(mut self, gas_price: GasPrice) -> Self {
        self.gas_price = Some(gas_price);
        self
    }

    pub fn nonce(mut self, nonce: impl Into<U256>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    pub fn memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    pub fn pre_submission_hook<F, Fut>(mut self, hook: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = SubmitterResult<()>> + Send + 'static,
    {
        self.pre_submission_hook = Some(Box::new(move || Box::pin(hook())));
        self
    }

    pub fn callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(super::events::TransactionEvent) + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(callback));
        self
    }
}

impl fmt::Debug for WalletTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletTransaction")
            .field("chain_id", &self.chain_id)
            .field("from", &self.signer.address())
            .field("to", &self.to)
            .field("call_data", &self.call_data)
            .field("value", &self.value)
            .field("gas_limit", &self.gas_limit)
            .field("gas_price", &self.gas_price)
            .field("nonce", &self.nonce)
            .field("memo", &self.memo)
            .field("pre_submission_hook", &self.pre_submission_hook.is_some())
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

/// Outcome of `send_wallet_transaction`
#[derive(Clone)]
pub struct SubmissionResult {
    /// `None` only when the submission was simulated
    pub transaction_hash: Option<H256>,
    waiter: FinalizationWaiter,
}

impl SubmissionResult {
    pub(crate) fn new(transaction_hash: Option<H256>, waiter: FinalizationWaiter) -> Self {
        Self {
            transaction_hash,
            waiter,
        }
    }

    /// Wait for the transaction to reach a terminal on-chain state
    pub async fn wait(&self) -> SubmitterResult<FinalizationResult> {
        self.waiter.wait().await
    }
}

impl fmt::Debug for SubmissionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmissionResult")
            .field("transaction_hash", &self.transaction_hash)
            .finish_non_exhaustive()
    }
}
