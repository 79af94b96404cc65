//! Collaborator contracts used by the submitter

use super::simulation::SimulationParams;
use super::types::{GasEstimateRequest, GasPrice, WalletTransactionRequest};
use crate::chain::ChainProvider;
use crate::error::{SubmitterError, SubmitterResult};

use async_trait::async_trait;
use ethers::types::{Address, TransactionReceipt, H256, U256};
use std::sync::Arc;

/// Entity able to authorize and broadcast transactions for one address
#[async_trait]
pub trait WalletSigner: Send + Sync {
    fn address(&self) -> Address;

    /// Network handle passed on to the other collaborators
    fn provider(&self) -> Option<Arc<ChainProvider>>;

    async fn send_transaction(
        &self,
        request: WalletTransactionRequest,
    ) -> SubmitterResult<Arc<dyn BroadcastResponse>>;
}

/// A broadcast transaction awaiting inclusion
#[async_trait]
pub trait BroadcastResponse: Send + Sync {
    fn hash(&self) -> H256;

    /// Resolves once the transaction is mined, or `None` if it was dropped
    async fn wait(&self) -> SubmitterResult<Option<TransactionReceipt>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GasEstimator: Send + Sync {
    async fn estimate_gas(
        &self,
        provider: Option<Arc<ChainProvider>>,
        request: &GasEstimateRequest,
    ) -> SubmitterResult<U256>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GasPriceOracle: Send + Sync {
    async fn gas_price(
        &self,
        provider: Option<Arc<ChainProvider>>,
        chain_id: u64,
    ) -> SubmitterResult<GasPrice>;
}

/// Dry-run execution backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SimulationBackend: Send + Sync {
    async fn simulate(&self, params: SimulationParams) -> SubmitterResult<()>;
}

/// Inspects a failed broadcast; `Err` carries a more specific diagnosis
#[cfg_attr(test, mockall::automock)]
pub trait ErrorValidator: Send + Sync {
    fn validate(
        &self,
        error: &SubmitterError,
        chain_id: u64,
        provider: Option<Arc<ChainProvider>>,
        request: &WalletTransactionRequest,
    ) -> SubmitterResult<()>;
}
