//! Fixed gas parameters for chains whose estimation endpoints are unreliable
//!
//! A profile is consulted only when the estimator or the price oracle could
//! not produce a value, except for `base_gas`, which is always attached to
//! transactions on a chain that defines a profile.

use ethers::types::U256;

/// Botanix mainnet
pub const BOTANIX_CHAIN_ID: u64 = 3637;

/// Gas parameters substituted when dynamic resolution is unavailable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackProfile {
    gas_limit: u64,
    gas_price: u64,
    base_gas: u64,
}

impl FallbackProfile {
    pub fn gas_limit(&self) -> U256 {
        U256::from(self.gas_limit)
    }

    pub fn gas_price(&self) -> U256 {
        U256::from(self.gas_price)
    }

    pub fn base_gas(&self) -> U256 {
        U256::from(self.base_gas)
    }
}

/// Chain-keyed fallback table
pub const FALLBACK_PROFILES: &[(u64, FallbackProfile)] = &[(
    BOTANIX_CHAIN_ID,
    FallbackProfile {
        gas_limit: 1_000_000,
        gas_price: 1_000_000_000,
        base_gas: 100_000,
    },
)];

/// Look up the fallback profile for a chain
pub fn fallback_profile(chain_id: u64) -> Option<&'static FallbackProfile> {
    FALLBACK_PROFILES
        .iter()
        .find(|(id, _)| *id == chain_id)
        .map(|(_, profile)| profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_botanix_profile() {
        let profile = fallback_profile(BOTANIX_CHAIN_ID).unwrap();
        assert_eq!(profile.gas_limit(), U256::from(1_000_000u64));
        assert_eq!(profile.gas_price(), U256::from(1_000_000_000u64));
        assert_eq!(profile.base_gas(), U256::from(100_000u64));
    }

    #[test]
    fn test_other_chains_have_no_profile() {
        for chain_id in [1, 10, 137, 42161, 43114] {
            assert!(fallback_profile(chain_id).is_none());
        }
    }
}
