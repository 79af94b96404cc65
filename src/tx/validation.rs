//! Classification of node errors returned from a failed broadcast

use super::traits::ErrorValidator;
use super::types::WalletTransactionRequest;
use crate::chain::ChainProvider;
use crate::error::{SubmitterError, SubmitterResult};

use std::sync::Arc;
use tracing::warn;

/// Maps well-known node error messages to specific errors
#[derive(Debug, Default)]
pub struct ChainErrorValidator;

impl ChainErrorValidator {
    pub fn new() -> Self {
        Self
    }
}

impl ErrorValidator for ChainErrorValidator {
    fn validate(
        &self,
        error: &SubmitterError,
        chain_id: u64,
        _provider: Option<Arc<ChainProvider>>,
        request: &WalletTransactionRequest,
    ) -> SubmitterResult<()> {
        let error_msg = error.to_string().to_lowercase();

        if error_msg.contains("nonce too low") {
            warn!("Nonce too low on chain {} (nonce {:?})", chain_id, request.nonce);
            return Err(SubmitterError::Nonce {
                chain_id,
                message: "Nonce too low".to_string(),
            });
        }

        if error_msg.contains("replacement transaction underpriced") {
            warn!("Transaction underpriced on chain {}", chain_id);
            return Err(SubmitterError::Underpriced { chain_id });
        }

        if error_msg.contains("insufficient funds") {
            // Caller-supplied gas limits are unbounded; overflow reports "unknown"
            let need = request
                .gas_limit
                .zip(request.gas_price)
                .and_then(|(gas, price)| gas.checked_mul(price.max_fee_per_gas()))
                .and_then(|cost| cost.checked_add(request.value.unwrap_or_default()))
                .map(|need| need.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            return Err(SubmitterError::InsufficientBalance {
                chain_id,
                have: "unknown".to_string(),
                need,
            });
        }

        if error_msg.contains("rate limit") || error_msg.contains("429") {
            return Err(SubmitterError::RateLimited { chain_id });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::GasPrice;
    use ethers::types::U256;

    fn validate(message: &str, request: &WalletTransactionRequest) -> SubmitterResult<()> {
        ChainErrorValidator::new().validate(
            &SubmitterError::Transaction(message.to_string()),
            1,
            None,
            request,
        )
    }

    #[test]
    fn test_known_messages_are_classified() {
        let request = WalletTransactionRequest::default();

        assert!(matches!(
            validate("nonce too low: next nonce 5", &request),
            Err(SubmitterError::Nonce { chain_id: 1, .. })
        ));
        assert_eq!(
            validate("replacement transaction underpriced", &request),
            Err(SubmitterError::Underpriced { chain_id: 1 })
        );
        assert_eq!(
            validate("HTTP 429 Too Many Requests", &request),
            Err(SubmitterError::RateLimited { chain_id: 1 })
        );
    }

    #[test]
    fn test_insufficient_funds_reports_cost() {
        let request = WalletTransactionRequest {
            gas_limit: Some(U256::from(21_000u64)),
            value: Some(U256::from(1_000u64)),
            gas_price: Some(GasPrice::Legacy(U256::from(2u64))),
            ..Default::default()
        };

        assert_eq!(
            validate("insufficient funds for gas * price + value", &request),
            Err(SubmitterError::InsufficientBalance {
                chain_id: 1,
                have: "unknown".to_string(),
                need: "43000".to_string(),
            })
        );
    }

    #[test]
    fn test_insufficient_funds_with_overflowing_cost() {
        let request = WalletTransactionRequest {
            gas_limit: Some(U256::MAX),
            value: Some(U256::from(1u64)),
            gas_price: Some(GasPrice::Legacy(U256::from(2u64))),
            ..Default::default()
        };

        assert_eq!(
            validate("insufficient funds for gas * price + value", &request),
            Err(SubmitterError::InsufficientBalance {
                chain_id: 1,
                have: "unknown".to_string(),
                need: "unknown".to_string(),
            })
        );

        let request = WalletTransactionRequest {
            gas_limit: Some(U256::one()),
            value: Some(U256::MAX),
            gas_price: Some(GasPrice::Legacy(U256::one())),
            ..Default::default()
        };
        assert!(matches!(
            validate("insufficient funds", &request),
            Err(SubmitterError::InsufficientBalance { ref need, .. }) if need == "unknown"
        ));
    }

    #[test]
    fn test_unknown_errors_pass_through() {
        assert_eq!(
            validate("execution reverted", &WalletTransactionRequest::default()),
            Ok(())
        );
    }
}
