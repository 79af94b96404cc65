//! Chain provider with multi-RPC support and automatic failover

use crate::config::{ChainConfig, GasPriceStrategy};
use crate::error::{SubmitterError, SubmitterResult};
use crate::tx::GasPrice;

use ethers::prelude::*;
use ethers::providers::{Http, Provider, ProviderError, RpcError};
use ethers::types::transaction::eip2718::TypedTransaction;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Multi-provider wrapper with automatic failover
pub struct ChainProvider {
    /// Chain configuration
    config: ChainConfig,
    /// HTTP providers (multiple for failover)
    http_providers: Vec<Provider<Http>>,
    /// Current active provider index
    current_provider: AtomicUsize,
}

impl ChainProvider {
    /// Create a new chain provider
    pub fn new(config: ChainConfig) -> SubmitterResult<Self> {
        let mut http_providers = Vec::new();

        for url in &config.rpc_urls {
            match Provider::<Http>::try_from(url.as_str()) {
                Ok(provider) => {
                    let provider = provider.interval(Duration::from_millis(100));
                    http_providers.push(provider);
                    debug!("Added HTTP provider for chain {}: {}", config.chain_id, url);
                }
                Err(e) => {
                    warn!("Failed to create provider for {}: {}", url, e);
                }
            }
        }

        if http_providers.is_empty() {
            return Err(SubmitterError::ChainConnection {
                chain_id: config.chain_id,
                message: "No valid RPC providers".to_string(),
            });
        }

        Ok(Self {
            config,
            http_providers,
            current_provider: AtomicUsize::new(0),
        })
    }

    /// Get the active HTTP provider
    fn http(&self) -> &Provider<Http> {
        let idx = self.current_provider.load(Ordering::Relaxed);
        &self.http_providers[idx % self.http_providers.len()]
    }

    /// Switch to next available provider
    pub fn failover(&self) {
        let current = self.current_provider.load(Ordering::Relaxed);
        let next = (current + 1) % self.http_providers.len();
        self.current_provider.store(next, Ordering::Relaxed);
        warn!("Chain {} failover to provider {}", self.config.chain_id, next);
    }

    fn connection_error(&self, message: impl ToString) -> SubmitterError {
        SubmitterError::ChainConnection {
            chain_id: self.config.chain_id,
            message: message.to_string(),
        }
    }

    /// Run a request against each provider in turn until one answers.
    ///
    /// Only transport failures rotate to the next provider. A JSON-RPC error
    /// response means the node was reached and is returned immediately.
    async fn with_failover<T, F, Fut>(
        &self,
        method: &str,
        request: F,
    ) -> Result<T, ProviderError>
    where
        F: Fn(Provider<Http>) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut last_error = None;

        for _ in 0..self.http_providers.len() {
            match request(self.http().clone()).await {
                Ok(value) => return Ok(value),
                Err(e) if RpcError::as_error_response(&e).is_some() => return Err(e),
                Err(e) => {
                    warn!("{} failed on chain {}: {}", method, self.config.chain_id, e);
                    self.failover();
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ProviderError::CustomError("No providers configured".to_string())
        }))
    }

    /// Get current block number with failover
    pub async fn get_block_number(&self) -> SubmitterResult<u64> {
        self.with_failover("eth_blockNumber", |provider| async move {
            provider.get_block_number().await
        })
        .await
        .map(|block| block.as_u64())
        .map_err(|e| self.connection_error(e))
    }

    /// Get a transaction by hash; `None` once the node no longer knows it
    pub async fn get_transaction(&self, tx_hash: H256) -> SubmitterResult<Option<Transaction>> {
        self.with_failover("eth_getTransactionByHash", |provider| async move {
            provider.get_transaction(tx_hash).await
        })
        .await
        .map_err(|e| self.connection_error(e))
    }

    /// Get transaction receipt
    pub async fn get_transaction_receipt(
        &self,
        tx_hash: H256,
    ) -> SubmitterResult<Option<TransactionReceipt>> {
        self.with_failover("eth_getTransactionReceipt", |provider| async move {
            provider.get_transaction_receipt(tx_hash).await
        })
        .await
        .map_err(|e| self.connection_error(e))
    }

    /// Broadcast signed transaction bytes, returning the node-reported hash.
    /// A rejection by the node is never retried on another provider.
    pub async fn send_raw_transaction(&self, raw: Bytes) -> SubmitterResult<H256> {
        self.with_failover("eth_sendRawTransaction", |provider| {
            let raw = raw.clone();
            async move {
                provider
                    .send_raw_transaction(raw)
                    .await
                    .map(|pending| pending.tx_hash())
            }
        })
        .await
        .map_err(|e| SubmitterError::Transaction(e.to_string()))
    }

    /// Pending-state nonce for an address
    pub async fn get_transaction_count(&self, address: Address) -> SubmitterResult<U256> {
        self.with_failover("eth_getTransactionCount", |provider| async move {
            provider
                .get_transaction_count(address, Some(BlockNumber::Pending.into()))
                .await
        })
        .await
        .map_err(|e| SubmitterError::Nonce {
            chain_id: self.config.chain_id,
            message: e.to_string(),
        })
    }

    /// Execute a call against chain state without broadcasting
    pub async fn call(
        &self,
        tx: &TypedTransaction,
        block: Option<BlockId>,
    ) -> SubmitterResult<Bytes> {
        self.with_failover("eth_call", |provider| {
            let tx = tx.clone();
            async move { provider.call(&tx, block).await }
        })
        .await
        .map_err(|e| SubmitterError::Simulation(e.to_string()))
    }

    /// Estimate gas for a transaction
    pub async fn estimate_gas(&self, tx: &TypedTransaction) -> SubmitterResult<U256> {
        self.with_failover("eth_estimateGas", |provider| {
            let tx = tx.clone();
            async move { provider.estimate_gas(&tx, None).await }
        })
        .await
        .map_err(|e| SubmitterError::GasEstimation(e.to_string()))
    }

    /// Get current gas price based on chain strategy
    pub async fn get_gas_price(&self) -> SubmitterResult<GasPrice> {
        match self.config.gas_price_strategy {
            GasPriceStrategy::Legacy | GasPriceStrategy::Arbitrum => {
                // Arbitrum prices L1 + L2 gas behind a single legacy price
                Ok(GasPrice::Legacy(self.get_legacy_gas_price().await?))
            }
            GasPriceStrategy::Eip1559 | GasPriceStrategy::Optimism => {
                let (max_fee, priority_fee) = self.estimate_eip1559_fees().await?;
                Ok(GasPrice::Eip1559 {
                    max_fee_per_gas: max_fee,
                    max_priority_fee_per_gas: priority_fee,
                })
            }
        }
    }

    /// Flat gas price reported by the node, capped at `max_gas_price_gwei`
    pub async fn get_legacy_gas_price(&self) -> SubmitterResult<U256> {
        let price = self
            .with_failover("eth_gasPrice", |provider| async move {
                provider.get_gas_price().await
            })
            .await
            .map_err(|e| SubmitterError::GasEstimation(e.to_string()))?;
        Ok(std::cmp::min(price, self.max_gas_price()))
    }

    /// Estimate EIP-1559 fees
    async fn estimate_eip1559_fees(&self) -> SubmitterResult<(U256, U256)> {
        let block = self
            .with_failover("eth_getBlockByNumber", |provider| async move {
                provider.get_block(BlockNumber::Latest).await
            })
            .await
            .map_err(|e| SubmitterError::GasEstimation(e.to_string()))?
            .ok_or_else(|| SubmitterError::GasEstimation("No latest block".to_string()))?;

        let base_fee = block
            .base_fee_per_gas
            .ok_or_else(|| SubmitterError::GasEstimation("No base fee in block".to_string()))?;

        let priority_fee = U256::from(2_000_000_000u64); // 2 gwei default

        // Max fee = 2 * base_fee + priority_fee (buffer for block variability)
        let max_fee = base_fee * 2 + priority_fee;

        let max_fee = std::cmp::min(max_fee, self.max_gas_price());

        Ok((max_fee, std::cmp::min(priority_fee, max_fee)))
    }

    /// Configured price ceiling in wei
    fn max_gas_price(&self) -> U256 {
        U256::from(self.config.max_gas_price_gwei) * U256::from(1_000_000_000u64)
    }

    /// Get chain ID
    pub fn chain_id(&self) -> u64 {
        self.config.chain_id
    }

    /// Get chain name
    pub fn name(&self) -> &str {
        &self.config.name
    }
}
