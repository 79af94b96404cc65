//! Local private-key signer broadcasting through a [`ChainProvider`]

use super::traits::{BroadcastResponse, WalletSigner};
use super::types::{GasPrice, WalletTransactionRequest};
use crate::chain::ChainProvider;
use crate::config::WalletConfig;
use crate::error::{SubmitterError, SubmitterResult};

use async_trait::async_trait;
use ethers::prelude::*;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Signs with a local key and broadcasts raw transactions
pub struct LocalWalletSigner {
    /// Wallet for signing, bound to the provider's chain id
    wallet: LocalWallet,
    /// Chain provider
    provider: Arc<ChainProvider>,
    /// Delay between receipt polls
    poll_interval: Duration,
}

impl LocalWalletSigner {
    pub fn new(wallet: LocalWallet, provider: Arc<ChainProvider>, poll_interval: Duration) -> Self {
        let wallet = wallet.with_chain_id(provider.chain_id());
        info!(
            "Wallet signer initialized for chain {}: {:?}",
            provider.chain_id(),
            wallet.address()
        );
        Self {
            wallet,
            provider,
            poll_interval,
        }
    }

    /// Load wallet from the environment variable named in the config
    pub fn load_wallet(config: &WalletConfig) -> SubmitterResult<LocalWallet> {
        let key = std::env::var(&config.private_key_env).map_err(|_| {
            SubmitterError::Wallet(format!(
                "No wallet configured. Set {}",
                config.private_key_env
            ))
        })?;

        key.trim()
            .parse::<LocalWallet>()
            .map_err(|e| SubmitterError::Wallet(format!("Invalid private key: {}", e)))
    }

    /// Build a typed transaction from a resolved request
    pub fn build_transaction(&self, request: &WalletTransactionRequest) -> TypedTransaction {
        build_typed_transaction(request, self.provider.chain_id())
    }
}

/// Legacy when the price is flat or unknown, EIP-1559 when both fee fields are given
fn build_typed_transaction(request: &WalletTransactionRequest, chain_id: u64) -> TypedTransaction {
    let gas = request.gas.or(request.gas_limit);

    match request.gas_price {
        Some(GasPrice::Eip1559 {
            max_fee_per_gas,
            max_priority_fee_per_gas,
        }) => {
            let mut tx = Eip1559TransactionRequest::new()
                .to(request.to)
                .from(request.from)
                .data(request.data.clone())
                .chain_id(chain_id)
                .max_fee_per_gas(max_fee_per_gas)
                .max_priority_fee_per_gas(max_priority_fee_per_gas);
            if let Some(value) = request.value {
                tx = tx.value(value);
            }
            if let Some(nonce) = request.nonce {
                tx = tx.nonce(nonce);
            }
            if let Some(gas) = gas {
                tx = tx.gas(gas);
            }
            TypedTransaction::Eip1559(tx)
        }
        legacy => {
            let mut tx = TransactionRequest::new()
                .to(request.to)
                .from(request.from)
                .data(request.data.clone())
                .chain_id(chain_id);
            if let Some(value) = request.value {
                tx = tx.value(value);
            }
            if let Some(nonce) = request.nonce {
                tx = tx.nonce(nonce);
            }
            if let Some(gas) = gas {
                tx = tx.gas(gas);
            }
            if let Some(GasPrice::Legacy(price)) = legacy {
                tx = tx.gas_price(price);
            }
            TypedTransaction::Legacy(tx)
        }
    }
}

#[async_trait]
impl WalletSigner for LocalWalletSigner {
    fn address(&self) -> Address {
        self.wallet.address()
    }

    fn provider(&self) -> Option<Arc<ChainProvider>> {
        Some(self.provider.clone())
    }

    async fn send_transaction(
        &self,
        request: WalletTransactionRequest,
    ) -> SubmitterResult<Arc<dyn BroadcastResponse>> {
        if request.base_gas.is_some() {
            debug!(
                "Chain {} base gas {:?} is not part of the signed payload",
                self.provider.chain_id(),
                request.base_gas
            );
        }

        let mut tx = self.build_transaction(&request);

        // Nonce and gas left unset are filled from the node
        if tx.nonce().is_none() {
            let nonce = self
                .provider
                .get_transaction_count(self.wallet.address())
                .await?;
            tx.set_nonce(nonce);
        }
        if tx.gas().is_none() {
            let gas = self.provider.estimate_gas(&tx).await?;
            tx.set_gas(gas);
        }
        if let TypedTransaction::Legacy(ref mut legacy) = tx {
            if legacy.gas_price.is_none() {
                legacy.gas_price = Some(self.provider.get_legacy_gas_price().await?);
            }
        }

        let signature = self
            .wallet
            .sign_transaction(&tx)
            .await
            .map_err(|e| SubmitterError::Wallet(e.to_string()))?;
        let raw = tx.rlp_signed(&signature);

        let tx_hash = self.provider.send_raw_transaction(raw).await?;
        info!(
            "Broadcast transaction {:?} on chain {}",
            tx_hash,
            self.provider.chain_id()
        );

        Ok(Arc::new(PendingBroadcast::new(
            tx_hash,
            self.provider.clone(),
            self.poll_interval,
        )))
    }
}

/// Broadcast transaction whose receipt is polled once and then cached
pub struct PendingBroadcast {
    tx_hash: H256,
    provider: Arc<ChainProvider>,
    poll_interval: Duration,
    receipt: OnceCell<Option<TransactionReceipt>>,
}

impl PendingBroadcast {
    pub fn new(tx_hash: H256, provider: Arc<ChainProvider>, poll_interval: Duration) -> Self {
        Self {
            tx_hash,
            provider,
            poll_interval,
            receipt: OnceCell::new(),
        }
    }

    async fn poll_receipt(&self) -> SubmitterResult<Option<TransactionReceipt>> {
        loop {
            if let Some(receipt) = self.provider.get_transaction_receipt(self.tx_hash).await? {
                if receipt.block_number.is_some() {
                    return Ok(Some(receipt));
                }
            } else if self.provider.get_transaction(self.tx_hash).await?.is_none() {
                warn!(
                    "Transaction {:?} dropped from chain {}",
                    self.tx_hash,
                    self.provider.chain_id()
                );
                return Ok(None);
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl BroadcastResponse for PendingBroadcast {
    fn hash(&self) -> H256 {
        self.tx_hash
    }

    async fn wait(&self) -> SubmitterResult<Option<TransactionReceipt>> {
        self.receipt
            .get_or_try_init(|| self.poll_receipt())
            .await
            .cloned()
    }
}
