//! Wallet transaction submission with gas resolution, lifecycle events and finalization

mod events;
mod finality;
mod gas;
mod sender;
mod signer;
mod simulation;
mod traits;
mod types;
mod validation;

pub use events::{
    EventBuilder, EventCallback, EventContext, TransactionEvent, TransactionEventKind,
    TransactionType,
};
pub use finality::{FinalizationResult, FinalizationStatus, FinalizationWaiter};
pub use gas::{ParameterResolver, ProviderGasEstimator, ProviderGasPriceOracle, ResolvedGas};
pub use sender::{TransactionSubmitter, SENDING_CONTEXT};
pub use signer::{LocalWalletSigner, PendingBroadcast};
pub use simulation::{RpcCallSimulator, SimulationParams};
pub use traits::{
    BroadcastResponse, ErrorValidator, GasEstimator, GasPriceOracle, SimulationBackend,
    WalletSigner,
};
pub use types::{
    GasEstimateRequest, GasPrice, PreSubmissionHook, SubmissionResult, WalletTransaction,
    WalletTransactionRequest,
};
pub use validation::ChainErrorValidator;
