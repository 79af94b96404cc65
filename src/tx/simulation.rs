//! Simulation-only submission path
//!
//! When a [`SimulationBackend`] is configured the call data is dry-run there
//! instead of being signed and broadcast. Backend failures surface as is,
//! without lifecycle events.

use super::finality::FinalizationWaiter;
use super::traits::SimulationBackend;
use super::types::{GasPrice, SubmissionResult};
use crate::chain::ChainProvider;
use crate::error::{SubmitterError, SubmitterResult};

use async_trait::async_trait;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, BlockId, Bytes, TransactionRequest, U256};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Parameters forwarded to the simulation backend
#[derive(Clone)]
pub struct SimulationParams {
    pub chain_id: u64,
    pub provider: Option<Arc<ChainProvider>>,
    pub to: Address,
    pub data: Bytes,
    pub from: Address,
    pub value: Option<U256>,
    pub gas_limit: Option<U256>,
    pub gas_price: Option<GasPrice>,
    /// Block to simulate against; `None` means latest
    pub block_number: Option<u64>,
    pub comment: Option<String>,
}

impl fmt::Debug for SimulationParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationParams")
            .field("chain_id", &self.chain_id)
            .field("provider", &self.provider.as_ref().map(|p| p.name().to_string()))
            .field("to", &self.to)
            .field("data", &self.data)
            .field("from", &self.from)
            .field("value", &self.value)
            .field("gas_limit", &self.gas_limit)
            .field("gas_price", &self.gas_price)
            .field("block_number", &self.block_number)
            .field("comment", &self.comment)
            .finish()
    }
}

/// Dry-run the submission and return a result that never touched the chain
pub(crate) async fn simulate_submission(
    backend: &dyn SimulationBackend,
    params: SimulationParams,
) -> SubmitterResult<SubmissionResult> {
    let chain_id = params.chain_id;
    debug!("Simulating transaction on chain {}: {:?}", chain_id, params);

    backend.simulate(params).await?;

    info!("Simulation succeeded on chain {}", chain_id);
    crate::metrics::record_submission(chain_id, "simulated");

    Ok(SubmissionResult::new(None, FinalizationWaiter::simulated()))
}

/// Simulation backend that executes the call with `eth_call`
#[derive(Debug, Default)]
pub struct RpcCallSimulator;

impl RpcCallSimulator {
    pub fn new() -> Self {
        Self
    }

    fn build_call(params: &SimulationParams) -> TypedTransaction {
        let mut tx = TransactionRequest::new()
            .to(params.to)
            .from(params.from)
            .data(params.data.clone());
        if let Some(value) = params.value {
            tx = tx.value(value);
        }
        if let Some(gas_limit) = params.gas_limit {
            tx = tx.gas(gas_limit);
        }
        if let Some(GasPrice::Legacy(price)) = params.gas_price {
            tx = tx.gas_price(price);
        }
        TypedTransaction::Legacy(tx)
    }
}

#[async_trait]
impl SimulationBackend for RpcCallSimulator {
    async fn simulate(&self, params: SimulationParams) -> SubmitterResult<()> {
        let provider = params
            .provider
            .clone()
            .ok_or_else(|| SubmitterError::Simulation("No provider available".to_string()))?;

        let tx = Self::build_call(&params);
        let block = params.block_number.map(BlockId::from);

        let output = provider.call(&tx, block).await?;
        debug!(
            "Simulation of {} returned {} bytes",
            params.comment.as_deref().unwrap_or("transaction"),
            output.len()
        );
        Ok(())
    }
}
