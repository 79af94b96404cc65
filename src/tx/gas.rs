//! Gas parameter resolution with chain fallback profiles
//!
//! Estimation failures never abort a submission: a failed estimator or price
//! oracle resolves to `None`, and chains with a [`FallbackProfile`] get fixed
//! values substituted afterwards.
//!
//! [`FallbackProfile`]: crate::chain::FallbackProfile

use super::traits::{GasEstimator, GasPriceOracle};
use super::types::{GasEstimateRequest, GasPrice};
use crate::chain::{fallback_profile, ChainProvider};
use crate::error::{SubmitterError, SubmitterResult};

use async_trait::async_trait;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{TransactionRequest, U256};
use std::sync::Arc;
use tracing::{debug, warn};

/// Gas values after estimation and fallback substitution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedGas {
    pub gas_limit: Option<U256>,
    pub gas_price: Option<GasPrice>,
}

/// Resolves gas limit and gas price for a submission
pub struct ParameterResolver {
    estimator: Arc<dyn GasEstimator>,
    oracle: Arc<dyn GasPriceOracle>,
}

impl ParameterResolver {
    pub fn new(estimator: Arc<dyn GasEstimator>, oracle: Arc<dyn GasPriceOracle>) -> Self {
        Self { estimator, oracle }
    }

    /// Explicit limit wins; otherwise estimate, treating failure as unavailable
    pub async fn resolve_gas_limit(
        &self,
        chain_id: u64,
        provider: Option<Arc<ChainProvider>>,
        explicit: Option<U256>,
        request: &GasEstimateRequest,
    ) -> Option<U256> {
        if explicit.is_some() {
            return explicit;
        }

        match self.estimator.estimate_gas(provider, request).await {
            Ok(gas_limit) => {
                debug!("Estimated gas limit for chain {}: {}", chain_id, gas_limit);
                Some(gas_limit)
            }
            Err(e) => {
                warn!("Gas estimation unavailable on chain {}: {}", chain_id, e);
                crate::metrics::record_gas_unavailable(chain_id, "gas_limit");
                None
            }
        }
    }

    /// Explicit price wins; otherwise ask the oracle, treating failure as unavailable
    pub async fn resolve_gas_price(
        &self,
        chain_id: u64,
        provider: Option<Arc<ChainProvider>>,
        explicit: Option<GasPrice>,
    ) -> Option<GasPrice> {
        if explicit.is_some() {
            return explicit;
        }

        match self.oracle.gas_price(provider, chain_id).await {
            Ok(gas_price) => {
                debug!("Gas price for chain {}: {:?}", chain_id, gas_price);
                Some(gas_price)
            }
            Err(e) => {
                warn!("Gas price unavailable on chain {}: {}", chain_id, e);
                crate::metrics::record_gas_unavailable(chain_id, "gas_price");
                None
            }
        }
    }

    /// Fill values still missing from the chain's fallback profile, if it has one
    pub fn apply_fallback(chain_id: u64, resolved: ResolvedGas) -> ResolvedGas {
        let Some(profile) = fallback_profile(chain_id) else {
            return resolved;
        };

        let gas_limit = resolved.gas_limit.or_else(|| {
            warn!("Using fallback gas limit on chain {}", chain_id);
            crate::metrics::record_gas_fallback(chain_id, "gas_limit");
            Some(profile.gas_limit())
        });

        let gas_price = resolved.gas_price.or_else(|| {
            warn!("Using fallback gas price on chain {}", chain_id);
            crate::metrics::record_gas_fallback(chain_id, "gas_price");
            Some(GasPrice::Legacy(profile.gas_price()))
        });

        ResolvedGas {
            gas_limit,
            gas_price,
        }
    }
}

/// Apply a percentage buffer on top of a value
fn with_buffer(value: U256, buffer_percent: u64) -> U256 {
    value + value * buffer_percent / 100
}

/// Gas estimator backed by `eth_estimateGas`
pub struct ProviderGasEstimator {
    /// Buffer percentage for gas limit (e.g., 20 = 20% buffer)
    gas_limit_buffer_percent: u64,
}

impl ProviderGasEstimator {
    pub fn new(gas_limit_buffer_percent: u64) -> Self {
        Self {
            gas_limit_buffer_percent,
        }
    }
}

impl Default for ProviderGasEstimator {
    fn default() -> Self {
        Self::new(20)
    }
}

#[async_trait]
impl GasEstimator for ProviderGasEstimator {
    async fn estimate_gas(
        &self,
        provider: Option<Arc<ChainProvider>>,
        request: &GasEstimateRequest,
    ) -> SubmitterResult<U256> {
        let provider = provider
            .ok_or_else(|| SubmitterError::GasEstimation("No provider available".to_string()))?;

        let mut tx = TransactionRequest::new()
            .to(request.to)
            .from(request.from)
            .data(request.data.clone());
        if let Some(value) = request.value {
            tx = tx.value(value);
        }

        let estimate = provider.estimate_gas(&TypedTransaction::Legacy(tx)).await?;
        Ok(with_buffer(estimate, self.gas_limit_buffer_percent))
    }
}

/// Gas price oracle backed by the provider's pricing strategy
pub struct ProviderGasPriceOracle {
    /// Buffer percentage for gas price
    gas_price_buffer_percent: u64,
}

impl ProviderGasPriceOracle {
    pub fn new(gas_price_buffer_percent: u64) -> Self {
        Self {
            gas_price_buffer_percent,
        }
    }

    /// Add the configured buffer to every fee field
    pub fn buffered(&self, gas_price: GasPrice) -> GasPrice {
        let buffer = self.gas_price_buffer_percent;
        match gas_price {
            GasPrice::Legacy(price) => GasPrice::Legacy(with_buffer(price, buffer)),
            GasPrice::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            } => GasPrice::Eip1559 {
                max_fee_per_gas: with_buffer(max_fee_per_gas, buffer),
                max_priority_fee_per_gas: with_buffer(max_priority_fee_per_gas, buffer),
            },
        }
    }
}

impl Default for ProviderGasPriceOracle {
    fn default() -> Self {
        Self::new(10)
    }
}

#[async_trait]
impl GasPriceOracle for ProviderGasPriceOracle {
    async fn gas_price(
        &self,
        provider: Option<Arc<ChainProvider>>,
        chain_id: u64,
    ) -> SubmitterResult<GasPrice> {
        let provider = provider
            .ok_or_else(|| SubmitterError::GasEstimation("No provider available".to_string()))?;

        if provider.chain_id() != chain_id {
            return Err(SubmitterError::GasEstimation(format!(
                "Provider serves chain {}, not {}",
                provider.chain_id(),
                chain_id
            )));
        }

        let gas_price = provider.get_gas_price().await?;
        Ok(self.buffered(gas_price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::BOTANIX_CHAIN_ID;
    use crate::tx::traits::{MockGasEstimator, MockGasPriceOracle};
    use ethers::types::{Address, Bytes};

    fn estimate_request() -> GasEstimateRequest {
        GasEstimateRequest {
            to: Address::repeat_byte(0x11),
            from: Address::repeat_byte(0x22),
            data: Bytes::from(vec![0xde, 0xad, 0xbe, 0xef]),
            value: None,
        }
    }

    fn failing_resolver() -> ParameterResolver {
        let mut estimator = MockGasEstimator::new();
        estimator
            .expect_estimate_gas()
            .returning(|_, _| Err(SubmitterError::GasEstimation("execution reverted".into())));
        let mut oracle = MockGasPriceOracle::new();
        oracle
            .expect_gas_price()
            .returning(|_, _| Err(SubmitterError::GasEstimation("rpc down".into())));
        ParameterResolver::new(Arc::new(estimator), Arc::new(oracle))
    }

    #[tokio::test]
    async fn test_explicit_values_skip_collaborators() {
        let mut estimator = MockGasEstimator::new();
        estimator.expect_estimate_gas().never();
        let mut oracle = MockGasPriceOracle::new();
        oracle.expect_gas_price().never();
        let resolver = ParameterResolver::new(Arc::new(estimator), Arc::new(oracle));

        let explicit_price = GasPrice::Legacy(U256::from(7u64));
        let gas_limit = resolver
            .resolve_gas_limit(1, None, Some(U256::from(21_000u64)), &estimate_request())
            .await;
        let gas_price = resolver
            .resolve_gas_price(1, None, Some(explicit_price))
            .await;

        assert_eq!(gas_limit, Some(U256::from(21_000u64)));
        assert_eq!(gas_price, Some(explicit_price));
    }

    #[tokio::test]
    async fn test_collaborator_failures_resolve_to_none() {
        let resolver = failing_resolver();

        let gas_limit = resolver
            .resolve_gas_limit(1, None, None, &estimate_request())
            .await;
        let gas_price = resolver.resolve_gas_price(1, None, None).await;

        assert_eq!(gas_limit, None);
        assert_eq!(gas_price, None);
    }

    #[tokio::test]
    async fn test_estimator_receives_request() {
        let mut estimator = MockGasEstimator::new();
        estimator
            .expect_estimate_gas()
            .withf(|provider, request| provider.is_none() && *request == estimate_request())
            .times(1)
            .returning(|_, _| Ok(U256::from(45_000u64)));
        let resolver = ParameterResolver::new(Arc::new(estimator), Arc::new(MockGasPriceOracle::new()));

        let gas_limit = resolver
            .resolve_gas_limit(1, None, None, &estimate_request())
            .await;
        assert_eq!(gas_limit, Some(U256::from(45_000u64)));
    }

    #[test]
    fn test_fallback_fills_missing_values_on_botanix() {
        let resolved = ParameterResolver::apply_fallback(BOTANIX_CHAIN_ID, ResolvedGas::default());

        assert_eq!(resolved.gas_limit, Some(U256::from(1_000_000u64)));
        assert_eq!(
            resolved.gas_price,
            Some(GasPrice::Legacy(U256::from(1_000_000_000u64)))
        );
    }

    #[test]
    fn test_fallback_keeps_resolved_values() {
        let resolved = ResolvedGas {
            gas_limit: Some(U256::from(60_000u64)),
            gas_price: None,
        };
        let resolved = ParameterResolver::apply_fallback(BOTANIX_CHAIN_ID, resolved);

        assert_eq!(resolved.gas_limit, Some(U256::from(60_000u64)));
        assert_eq!(
            resolved.gas_price,
            Some(GasPrice::Legacy(U256::from(1_000_000_000u64)))
        );
    }

    #[test]
    fn test_no_fallback_on_other_chains() {
        let resolved = ParameterResolver::apply_fallback(1, ResolvedGas::default());
        assert_eq!(resolved, ResolvedGas::default());
    }

    #[test]
    fn test_price_buffer() {
        let oracle = ProviderGasPriceOracle::new(10);

        assert_eq!(
            oracle.buffered(GasPrice::Legacy(U256::from(100u64))),
            GasPrice::Legacy(U256::from(110u64))
        );
        assert_eq!(
            oracle.buffered(GasPrice::Eip1559 {
                max_fee_per_gas: U256::from(200u64),
                max_priority_fee_per_gas: U256::from(20u64),
            }),
            GasPrice::Eip1559 {
                max_fee_per_gas: U256::from(220u64),
                max_priority_fee_per_gas: U256::from(22u64),
            }
        );
    }

    #[tokio::test]
    async fn test_provider_backed_collaborators_need_a_provider() {
        let estimator = ProviderGasEstimator::default();
        let oracle = ProviderGasPriceOracle::default();

        assert!(matches!(
            estimator.estimate_gas(None, &estimate_request()).await,
            Err(SubmitterError::GasEstimation(_))
        ));
        assert!(matches!(
            oracle.gas_price(None, 1).await,
            Err(SubmitterError::GasEstimation(_))
        ));
    }
}
