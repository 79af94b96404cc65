//! Error types for wallet transaction submission

use thiserror::Error;

/// Main error type for the submitter
///
/// Every variant carries owned, comparable data so the same value can be
/// handed to the lifecycle callback and returned to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitterError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Chain connection error for chain {chain_id}: {message}")]
    ChainConnection { chain_id: u64, message: String },

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Nonce error for chain {chain_id}: {message}")]
    Nonce { chain_id: u64, message: String },

    #[error("Invalid nonce: {0}")]
    InvalidNonce(String),

    #[error("Gas estimation error: {0}")]
    GasEstimation(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Simulation failed: {0}")]
    Simulation(String),

    #[error("Pre-submission check failed: {0}")]
    PreSubmissionCheck(String),

    #[error("Transaction underpriced on chain {chain_id}")]
    Underpriced { chain_id: u64 },

    #[error("Insufficient balance on chain {chain_id}: have {have}, need {need}")]
    InsufficientBalance {
        chain_id: u64,
        have: String,
        need: String,
    },

    #[error("Rate limited on chain {chain_id}")]
    RateLimited { chain_id: u64 },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{context}: {source}")]
    Decorated {
        context: &'static str,
        source: Box<SubmitterError>,
    },
}

impl SubmitterError {
    /// Wrap the error with a named context tag, keeping the original as source
    pub fn with_context(self, context: &'static str) -> Self {
        SubmitterError::Decorated {
            context,
            source: Box::new(self),
        }
    }

    /// Outermost context tag, if the error was decorated
    pub fn context(&self) -> Option<&'static str> {
        match self {
            SubmitterError::Decorated { context, .. } => Some(*context),
            _ => None,
        }
    }

    /// Innermost undecorated error
    pub fn root_cause(&self) -> &SubmitterError {
        let mut current = self;
        while let SubmitterError::Decorated { source, .. } = current {
            current = &**source;
        }
        current
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.root_cause(),
            SubmitterError::ChainConnection { .. }
                | SubmitterError::RateLimited { .. }
                | SubmitterError::Underpriced { .. }
        )
    }
}

/// Result type for submitter operations
pub type SubmitterResult<T> = Result<T, SubmitterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoration_preserves_cause() {
        let original = SubmitterError::Transaction("execution reverted".to_string());
        let decorated = original.clone().with_context("sending");

        assert_eq!(decorated.context(), Some("sending"));
        assert_eq!(decorated.root_cause(), &original);
        assert_eq!(
            decorated.to_string(),
            "sending: Transaction error: execution reverted"
        );
        assert!(std::error::Error::source(&decorated).is_some());
    }

    #[test]
    fn test_retryable_looks_through_context() {
        let err = SubmitterError::RateLimited { chain_id: 1 }.with_context("sending");
        assert!(err.is_retryable());

        let err = SubmitterError::Wallet("locked".to_string()).with_context("sending");
        assert!(!err.is_retryable());
    }
}
