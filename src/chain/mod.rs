//! Chain module - RPC access and per-chain gas constants
//!
//! This module provides:
//! - Multi-RPC provider management with automatic failover
//! - Chain-keyed fallback gas profiles

pub mod fallback;
pub mod provider;

pub use fallback::{fallback_profile, FallbackProfile, BOTANIX_CHAIN_ID};
pub use provider::ChainProvider;
