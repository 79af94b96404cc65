//! Configuration management for the wallet transaction submitter
//!
//! Loads configuration from TOML files with environment variable substitution.

use anyhow::{Context, Result};
use ethers::types::{Address, Bytes, U256};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub submitter: SubmitterConfig,
    pub chain: ChainConfig,
    pub wallet: WalletConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub submission: Option<SubmissionConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitterConfig {
    pub receipt_poll_interval_ms: u64,
    #[serde(default = "default_gas_limit_buffer")]
    pub gas_limit_buffer_percent: u64,
    #[serde(default = "default_gas_price_buffer")]
    pub gas_price_buffer_percent: u64,
}

fn default_gas_limit_buffer() -> u64 {
    20
}

fn default_gas_price_buffer() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub name: String,
    pub rpc_urls: Vec<String>,
    pub gas_price_strategy: GasPriceStrategy,
    pub max_gas_price_gwei: u64,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GasPriceStrategy {
    Legacy,
    Eip1559,
    Arbitrum,
    Optimism,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    pub private_key_env: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimulationConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    pub json: bool,
}

/// Transaction submitted by the binary
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionConfig {
    pub to: Address,
    #[serde(default)]
    pub data: Bytes,
    pub value: Option<U256>,
    pub gas_limit: Option<u64>,
    pub nonce: Option<u64>,
    pub memo: Option<String>,
}

impl Settings {
    /// Load settings from the file named by `SUBMITTER_CONFIG`, or the default path
    pub fn load() -> Result<Self> {
        let config_path = env::var("SUBMITTER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/default.toml"));

        Self::load_from(&config_path)
    }

    /// Load settings from an explicit path
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        Self::parse(&config_str)
    }

    /// Parse settings from TOML text
    pub fn parse(config_str: &str) -> Result<Self> {
        // Substitute environment variables
        let config_str = substitute_env_vars(config_str);

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.chain.rpc_urls.is_empty() {
            anyhow::bail!("Chain {} has no RPC URLs configured", self.chain.name);
        }

        if self.submitter.receipt_poll_interval_ms == 0 {
            anyhow::bail!("receipt_poll_interval_ms must be greater than zero");
        }

        if self.wallet.private_key_env.is_empty() {
            anyhow::bail!("wallet.private_key_env must name an environment variable");
        }

        if self.metrics.enabled && self.metrics.port == 0 {
            tracing::warn!("Metrics enabled without a port - an ephemeral port will be used");
        }

        Ok(())
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    let mut result = input.to_string();
    let re = regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("static regex is valid");

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[submitter]
receipt_poll_interval_ms = 500

[chain]
chain_id = 3637
name = "botanix"
rpc_urls = ["https://rpc.botanixlabs.com"]
gas_price_strategy = "legacy"
max_gas_price_gwei = 50

[wallet]
private_key_env = "SUBMITTER_PRIVATE_KEY"

[simulation]
enabled = true

[submission]
to = "0x000000000000000000000000000000000000dead"
data = "0xa9059cbb"
gas_limit = 21000
memo = "transfer"
"#;

    #[test]
    fn test_env_var_substitution() {
        env::set_var("SUBMITTER_TEST_VAR", "test_value");
        let input = "url = \"https://api.example.com/${SUBMITTER_TEST_VAR}/endpoint\"";
        let result = substitute_env_vars(input);
        assert_eq!(result, "url = \"https://api.example.com/test_value/endpoint\"");
    }

    #[test]
    fn test_parse_sample_config() {
        let settings = Settings::parse(SAMPLE).unwrap();

        assert_eq!(settings.chain.chain_id, 3637);
        assert_eq!(settings.chain.gas_price_strategy, GasPriceStrategy::Legacy);
        assert_eq!(settings.submitter.gas_limit_buffer_percent, 20);
        assert_eq!(settings.submitter.gas_price_buffer_percent, 10);
        assert!(settings.simulation.enabled);
        assert!(!settings.metrics.enabled);

        let submission = settings.submission.unwrap();
        assert_eq!(submission.gas_limit, Some(21000));
        assert_eq!(submission.data.to_vec(), vec![0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(submission.value, None);
    }

    #[test]
    fn test_rejects_empty_rpc_list() {
        let broken = SAMPLE.replace(
            "rpc_urls = [\"https://rpc.botanixlabs.com\"]",
            "rpc_urls = []",
        );
        assert!(Settings::parse(&broken).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let settings = Settings::load_from(file.path()).unwrap();
        assert_eq!(settings.chain.name, "botanix");
    }
}
