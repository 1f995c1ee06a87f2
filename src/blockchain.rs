use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use ethers::{
    prelude::*,
    providers::{Http, Provider},
    types::{Address, Transaction, TransactionReceipt, H256, U256, U64},
};
use std::{str::FromStr, sync::Arc};
use tracing::{debug, info};

use crate::config::Config;

#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn get_transaction(&self, hash: H256) -> Result<Option<Transaction>>;

    async fn get_block_number(&self) -> Result<U64>;

    async fn get_transaction_count(&self, address: Address) -> Result<U256>;

    async fn get_transaction_receipt(&self, hash: H256) -> Result<Option<TransactionReceipt>>;
}

pub struct BlockchainClient {
    provider: Arc<Provider<Http>>,
}

impl BlockchainClient {
    pub async fn new(config: &Config) -> Result<Self> {
        info!("Connecting to RPC: {}", config.blockchain.http_rpc_url);

        let provider = Provider::<Http>::try_from(config.blockchain.http_rpc_url.as_str())
            .map_err(|e| anyhow!("Failed to create provider: {}", e))?;

        let provider = Arc::new(provider);

        let chain_id = provider
            .get_chainid()
            .await
            .map_err(|e| anyhow!("Failed to get chain ID: {}", e))?;

        if chain_id.as_u64() != config.blockchain.chain_id {
            return Err(anyhow!(
                "Chain ID mismatch: expected {}, got {}",
                config.blockchain.chain_id,
                chain_id.as_u64()
            ));
        }

        info!("Connected to network (Chain ID: {})", chain_id);

        Ok(Self { provider })
    }

    pub fn provider(&self) -> Arc<Provider<Http>> {
        self.provider.clone()
    }

    pub async fn health_check(&self) -> Result<()> {
        debug!("Performing blockchain health check");

        let block_number = ChainClient::get_block_number(self).await?;
        let gas_price = self
            .provider
            .get_gas_price()
            .await
            .map_err(|e| anyhow!("Failed to get gas price: {}", e))?;

        debug!(
            "Health check passed - Block: {}, Gas Price: {:.2} gwei",
            block_number,
            wei_to_gwei(gas_price)
        );

        Ok(())
    }
}

#[async_trait]
impl ChainClient for BlockchainClient {
    async fn get_transaction(&self, hash: H256) -> Result<Option<Transaction>> {
        self.provider
            .get_transaction(hash)
            .await
            .map_err(|e| anyhow!("Failed to get transaction {:?}: {}", hash, e))
    }

    async fn get_block_number(&self) -> Result<U64> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| anyhow!("Failed to get block number: {}", e))
    }

    async fn get_transaction_count(&self, address: Address) -> Result<U256> {
        self.provider
            .get_transaction_count(address, Some(BlockNumber::Latest.into()))
            .await
            .map_err(|e| anyhow!("Failed to get nonce for {:?}: {}", address, e))
    }

    async fn get_transaction_receipt(&self, hash: H256) -> Result<Option<TransactionReceipt>> {
        self.provider
            .get_transaction_receipt(hash)
            .await
            .map_err(|e| anyhow!("Failed to get receipt for {:?}: {}", hash, e))
    }
}

pub fn parse_address(address_str: &str) -> Result<Address> {
    address_str
        .trim()
        .parse::<Address>()
        .map_err(|e| anyhow!("Invalid address format '{}': {}", address_str, e))
}

pub fn u256_to_f64(value: U256) -> f64 {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);

    let mut result = 0.0f64;
    for (i, &byte) in bytes.iter().enumerate() {
        result += (byte as f64) * 256.0f64.powi(31 - i as i32);
    }
    result
}

pub fn wei_to_ether(wei: U256) -> f64 {
    u256_to_f64(wei) / 1e18
}

pub fn wei_to_gwei(wei: U256) -> f64 {
    u256_to_f64(wei) / 1e9
}

pub fn wei_to_ether_decimal(wei: U256) -> BigDecimal {
    BigDecimal::from_str(&format!("{}e-18", wei)).unwrap_or_else(|_| BigDecimal::from(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        let valid_address = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2";
        assert!(parse_address(valid_address).is_ok());

        let invalid_address = "invalid_address";
        assert!(parse_address(invalid_address).is_err());
    }

    #[test]
    fn test_parse_address_ignores_case() {
        let checksummed = parse_address("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2").unwrap();
        let lower = parse_address("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2").unwrap();
        let upper = parse_address("0xC02AAA39B223FE8D0A0E5C4F27EAD9083C756CC2").unwrap();
        assert_eq!(checksummed, lower);
        assert_eq!(checksummed, upper);
    }

    #[test]
    fn test_wei_conversions() {
        let one_ether_wei = U256::from(1_000_000_000_000_000_000u64);
        assert_eq!(wei_to_ether(one_ether_wei), 1.0);

        let one_gwei_wei = U256::from(1_000_000_000u64);
        assert_eq!(wei_to_gwei(one_gwei_wei), 1.0);
    }

    #[test]
    fn test_wei_to_ether_decimal_is_exact() {
        let wei = U256::from(100_000_000_000_000_001u64);
        assert_eq!(
            wei_to_ether_decimal(wei),
            BigDecimal::from_str("0.100000000000000001").unwrap()
        );
    }
}
