//! Lifecycle notifications emitted while a wallet transaction is submitted
//!
//! Events are built by [`EventBuilder`] and forwarded to the caller's
//! callback by [`EventReporter`]. They are never stored.

use crate::error::SubmitterError;

use ethers::types::H256;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Observer invoked synchronously at each lifecycle transition
pub type EventCallback = Arc<dyn Fn(TransactionEvent) + Send + Sync>;

/// How the transaction reached the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Wallet,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionType::Wallet => f.write_str("wallet"),
        }
    }
}

/// Execution context embedded into every event of one submission
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventContext {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionEventKind {
    /// The pre-submission hook completed
    Simulated,
    /// Gas parameters are resolved and the signer is about to be called
    Sending,
    /// The signer accepted and broadcast the transaction
    Sent {
        tx_type: TransactionType,
        transaction_hash: H256,
    },
    /// The submission failed; the same error is returned to the caller
    Error { cause: SubmitterError },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionEvent {
    pub context: EventContext,
    pub kind: TransactionEventKind,
}

impl TransactionEvent {
    /// Event name for logs and metrics
    pub fn name(&self) -> &'static str {
        match self.kind {
            TransactionEventKind::Simulated => "simulated",
            TransactionEventKind::Sending => "sending",
            TransactionEventKind::Sent { .. } => "sent",
            TransactionEventKind::Error { .. } => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            TransactionEventKind::Sent { .. } | TransactionEventKind::Error { .. }
        )
    }
}

/// Builds events for one submission
#[derive(Debug, Clone, Default)]
pub struct EventBuilder {
    context: EventContext,
}

impl EventBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(context: EventContext) -> Self {
        Self { context }
    }

    fn event(&self, kind: TransactionEventKind) -> TransactionEvent {
        TransactionEvent {
            context: self.context.clone(),
            kind,
        }
    }

    pub fn simulated(&self) -> TransactionEvent {
        self.event(TransactionEventKind::Simulated)
    }

    pub fn sending(&self) -> TransactionEvent {
        self.event(TransactionEventKind::Sending)
    }

    pub fn sent(&self, tx_type: TransactionType, transaction_hash: H256) -> TransactionEvent {
        self.event(TransactionEventKind::Sent {
            tx_type,
            transaction_hash,
        })
    }

    pub fn error(&self, cause: SubmitterError) -> TransactionEvent {
        self.event(TransactionEventKind::Error { cause })
    }
}

/// Pairs a builder with the caller's optional callback
pub(crate) struct EventReporter {
    builder: EventBuilder,
    callback: Option<EventCallback>,
}

impl EventReporter {
    pub(crate) fn new(builder: EventBuilder, callback: Option<EventCallback>) -> Self {
        Self { builder, callback }
    }

    pub(crate) fn builder(&self) -> &EventBuilder {
        &self.builder
    }

    pub(crate) fn emit(&self, event: TransactionEvent) {
        match &event.kind {
            TransactionEventKind::Sent {
                tx_type,
                transaction_hash,
            } => info!("Transaction sent ({}): {:?}", tx_type, transaction_hash),
            TransactionEventKind::Error { cause } => warn!("Transaction failed: {}", cause),
            _ => debug!("Transaction event: {}", event.name()),
        }

        if let Some(callback) = &self.callback {
            callback(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_builder_embeds_context() {
        let builder = EventBuilder::with_context(EventContext::default());
        let hash = H256::repeat_byte(0xab);

        let sent = builder.sent(TransactionType::Wallet, hash);
        assert_eq!(sent.context, EventContext::default());
        assert_eq!(
            sent.kind,
            TransactionEventKind::Sent {
                tx_type: TransactionType::Wallet,
                transaction_hash: hash,
            }
        );
        assert!(sent.is_terminal());
        assert!(!builder.sending().is_terminal());
        assert_eq!(builder.simulated().name(), "simulated");
    }

    #[test]
    fn test_transaction_type_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&TransactionType::Wallet).unwrap(),
            "\"wallet\""
        );
    }

    #[test]
    fn test_reporter_forwards_to_callback() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let reporter = EventReporter::new(
            EventBuilder::new(),
            Some(Arc::new(move |event: TransactionEvent| {
                sink.lock().unwrap().push(event.name());
            })),
        );

        reporter.emit(reporter.builder().sending());
        reporter.emit(
            reporter
                .builder()
                .error(SubmitterError::Internal("boom".to_string())),
        );

        assert_eq!(*seen.lock().unwrap(), vec!["sending", "error"]);
    }

    #[test]
    fn test_reporter_without_callback_is_silent() {
        let reporter = EventReporter::new(EventBuilder::new(), None);
        reporter.emit(reporter.builder().simulated());
    }
}
