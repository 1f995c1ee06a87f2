use anyhow::{anyhow, Result};
use ethers::{
    types::{Address, U256},
    utils::{parse_ether, parse_units},
};
use serde::{Deserialize, Serialize};

use crate::blockchain::parse_address;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub blockchain: BlockchainConfig,
    pub wallet: WalletConfig,
    pub contracts: ContractsConfig,
    pub relay: RelayConfig,
    pub sandwich: SandwichConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BlockchainConfig {
    pub http_rpc_url: String,
    pub ws_rpc_url: String,
    pub chain_id: u64,
}

#[derive(Deserialize, Serialize, Clone)]
pub struct WalletConfig {
    pub private_key: String,
    #[serde(default)]
    pub relay_auth_key: Option<String>,
}

impl std::fmt::Debug for WalletConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletConfig")
            .field("private_key", &"<redacted>")
            .field(
                "relay_auth_key",
                &self.relay_auth_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ContractsConfig {
    pub weth: String,
    pub universal_router: String,
    pub v2_router: String,
    pub v2_factory: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RelayConfig {
    pub url: String,
    pub poll_interval_ms: u64,
    pub max_wait_blocks: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SandwichConfig {
    pub bribe_gwei: String,
    pub front_run_amount_ether: String,
    pub gas_limit: u64,
    pub deadline_secs: u64,
    pub max_in_flight: usize,
    pub queue_capacity: usize,
    pub seen_cache_size: usize,
    pub metrics_interval_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractAddresses {
    pub weth: Address,
    pub universal_router: Address,
    pub v2_router: Address,
    pub v2_factory: Address,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let mut settings = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("SANDWICH").separator("__"));

        // Unprefixed variable names kept for existing .env files.
        if let Ok(url) = std::env::var("HTTP_PROVIDER_URL") {
            settings = settings.set_override("blockchain.http_rpc_url", url)?;
        }
        if let Ok(url) = std::env::var("WS_PROVIDER_URL") {
            settings = settings.set_override("blockchain.ws_rpc_url", url)?;
        }
        if let Ok(url) = std::env::var("FLASHBOTS_URL") {
            settings = settings.set_override("relay.url", url)?;
        }
        if let Ok(key) = std::env::var("PRIVATE_KEY") {
            settings = settings.set_override("wallet.private_key", key)?;
        }

        let config: Config = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.blockchain.chain_id == 0 {
            return Err(anyhow!("blockchain.chain_id must be non-zero"));
        }
        if self.wallet.private_key.trim().is_empty() {
            return Err(anyhow!("wallet.private_key is not set"));
        }
        self.contract_addresses()?;
        self.bribe()?;
        if self.front_run_amount()?.is_zero() {
            return Err(anyhow!("sandwich.front_run_amount_ether must be non-zero"));
        }
        if self.sandwich.max_in_flight == 0 {
            return Err(anyhow!("sandwich.max_in_flight must be at least 1"));
        }
        if self.sandwich.queue_capacity == 0 {
            return Err(anyhow!("sandwich.queue_capacity must be at least 1"));
        }
        if self.sandwich.gas_limit == 0 {
            return Err(anyhow!("sandwich.gas_limit must be non-zero"));
        }
        Ok(())
    }

    pub fn contract_addresses(&self) -> Result<ContractAddresses> {
        Ok(ContractAddresses {
            weth: parse_address(&self.contracts.weth)?,
            universal_router: parse_address(&self.contracts.universal_router)?,
            v2_router: parse_address(&self.contracts.v2_router)?,
            v2_factory: parse_address(&self.contracts.v2_factory)?,
        })
    }

    pub fn bribe(&self) -> Result<U256> {
        let units = parse_units(self.sandwich.bribe_gwei.trim(), "gwei")
            .map_err(|e| anyhow!("Invalid sandwich.bribe_gwei: {}", e))?;
        Ok(units.into())
    }

    pub fn front_run_amount(&self) -> Result<U256> {
        parse_ether(self.sandwich.front_run_amount_ether.trim())
            .map_err(|e| anyhow!("Invalid sandwich.front_run_amount_ether: {}", e))
    }
}
