//! Wallet transaction submission orchestrator
//!
//! A submission either goes entirely through the simulation backend, or runs
//! gas resolution and the optional pre-submission hook concurrently, then
//! signs and broadcasts through the caller's signer. Lifecycle events are
//! reported to the optional callback in the order
//! `Simulated? -> Sending -> Sent`, or as a single `Error`.

use super::events::{EventBuilder, EventReporter, TransactionType};
use super::finality::FinalizationWaiter;
use super::gas::{ParameterResolver, ResolvedGas};
use super::simulation::{simulate_submission, SimulationParams};
use super::traits::{ErrorValidator, GasEstimator, GasPriceOracle, SimulationBackend};
use super::types::{
    GasEstimateRequest, SubmissionResult, WalletTransaction, WalletTransactionRequest,
};
use crate::chain::fallback_profile;
use crate::error::{SubmitterError, SubmitterResult};

use ethers::types::U256;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

/// Context tag attached to broadcast failures
pub const SENDING_CONTEXT: &str = "sending";

/// Submits wallet transactions, resolving gas and reporting lifecycle events
pub struct TransactionSubmitter {
    /// Gas limit / price resolution
    resolver: ParameterResolver,
    /// Dry-run backend; when set, nothing is ever broadcast
    simulation: Option<Arc<dyn SimulationBackend>>,
    /// Classifies broadcast failures
    validator: Arc<dyn ErrorValidator>,
}

impl TransactionSubmitter {
    /// Create a new transaction submitter
    pub fn new(
        estimator: Arc<dyn GasEstimator>,
        oracle: Arc<dyn GasPriceOracle>,
        validator: Arc<dyn ErrorValidator>,
    ) -> Self {
        Self {
            resolver: ParameterResolver::new(estimator, oracle),
            simulation: None,
            validator,
        }
    }

    /// Route every submission to a simulation backend instead of the chain
    pub fn with_simulation(mut self, backend: Arc<dyn SimulationBackend>) -> Self {
        self.simulation = Some(backend);
        self
    }

    pub fn is_simulating(&self) -> bool {
        self.simulation.is_some()
    }

    /// Submit a single wallet transaction
    pub async fn send_wallet_transaction(
        &self,
        tx: WalletTransaction,
    ) -> SubmitterResult<SubmissionResult> {
        let submission_id = Uuid::new_v4();
        let span = info_span!(
            "send_wallet_transaction",
            chain_id = tx.chain_id,
            submission_id = %submission_id
        );

        self.submit(tx).instrument(span).await
    }

    async fn submit(&self, mut tx: WalletTransaction) -> SubmitterResult<SubmissionResult> {
        let chain_id = tx.chain_id;

        if let Some(backend) = &self.simulation {
            let params = SimulationParams {
                chain_id,
                provider: tx.signer.provider(),
                to: tx.to,
                data: tx.call_data,
                from: tx.signer.address(),
                value: tx.value,
                gas_limit: tx.gas_limit,
                gas_price: tx.gas_price,
                block_number: None,
                comment: tx.memo,
            };
            return simulate_submission(backend.as_ref(), params).await;
        }

        let events = EventReporter::new(EventBuilder::new(), tx.callback.take());

        match self.broadcast(tx, &events).await {
            Ok(result) => {
                crate::metrics::record_submission(chain_id, "broadcast");
                Ok(result)
            }
            Err(e) => {
                error!(
                    retryable = e.is_retryable(),
                    "Wallet transaction on chain {} failed: {}", chain_id, e
                );
                crate::metrics::record_submission_failed(chain_id);
                events.emit(events.builder().error(e.clone()));
                Err(e)
            }
        }
    }

    /// Resolve parameters, sign and broadcast. Every error returned from here
    /// is reported exactly once by the caller.
    async fn broadcast(
        &self,
        tx: WalletTransaction,
        events: &EventReporter,
    ) -> SubmitterResult<SubmissionResult> {
        let WalletTransaction {
            chain_id,
            signer,
            to,
            call_data,
            value,
            gas_limit,
            gas_price,
            nonce,
            memo,
            pre_submission_hook,
            ..
        } = tx;

        let from = signer.address();
        let provider = signer.provider();

        debug!(
            "Submitting {} to {:?} (selector 0x{})",
            memo.as_deref().unwrap_or("transaction"),
            to,
            hex::encode(&call_data[..call_data.len().min(4)])
        );

        let estimate_request = GasEstimateRequest {
            to,
            from,
            data: call_data.clone(),
            value,
        };

        // The gas futures are infallible; only the hook can fail the join
        let hook = async {
            if let Some(hook) = pre_submission_hook {
                hook().await?;
                events.emit(events.builder().simulated());
            }
            Ok::<_, SubmitterError>(())
        };
        let resolve_limit = async {
            Ok::<_, SubmitterError>(
                self.resolver
                    .resolve_gas_limit(chain_id, provider.clone(), gas_limit, &estimate_request)
                    .await,
            )
        };
        let resolve_price = async {
            Ok::<_, SubmitterError>(
                self.resolver
                    .resolve_gas_price(chain_id, provider.clone(), gas_price)
                    .await,
            )
        };

        let ((), gas_limit, gas_price) = futures::try_join!(hook, resolve_limit, resolve_price)?;
        let resolved =
            ParameterResolver::apply_fallback(chain_id, ResolvedGas { gas_limit, gas_price });

        events.emit(events.builder().sending());

        let request = WalletTransactionRequest {
            to,
            data: call_data,
            value,
            from,
            nonce: nonce.map(coerce_nonce).transpose()?,
            gas_limit: resolved.gas_limit,
            gas: resolved.gas_limit,
            base_gas: fallback_profile(chain_id).map(|profile| profile.base_gas()),
            gas_price: resolved.gas_price,
        };

        let response = match signer.send_transaction(request.clone()).await {
            Ok(response) => response,
            Err(e) => {
                let e = match self.validator.validate(&e, chain_id, provider, &request) {
                    Ok(()) => e,
                    Err(specific) => specific,
                };
                return Err(e.with_context(SENDING_CONTEXT));
            }
        };

        let transaction_hash = response.hash();
        events.emit(events.builder().sent(TransactionType::Wallet, transaction_hash));
        info!("Wallet transaction {:?} sent on chain {}", transaction_hash, chain_id);

        Ok(SubmissionResult::new(
            Some(transaction_hash),
            FinalizationWaiter::new(transaction_hash, response),
        ))
    }
}

/// Nonces travel as `U256` but must fit the signer's plain integer
fn coerce_nonce(nonce: U256) -> SubmitterResult<u64> {
    if nonce > U256::from(u64::MAX) {
        return Err(SubmitterError::InvalidNonce(nonce.to_string()));
    }
    Ok(nonce.as_u64())
}
