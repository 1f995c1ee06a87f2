use anyhow::{anyhow, Result};
use async_trait::async_trait;
use ethers::{
    abi::{self, Abi},
    contract::{BaseContract, Contract},
    prelude::*,
    types::{Address, Bytes, U256},
};
use std::sync::Arc;
use tracing::debug;

use crate::{blockchain::BlockchainClient, dex::traits::ReserveSource};

const FACTORY_ABI: &str = r#"
[
    {
        "inputs": [
            {"internalType": "address", "name": "tokenA", "type": "address"},
            {"internalType": "address", "name": "tokenB", "type": "address"}
        ],
        "name": "getPair",
        "outputs": [
            {"internalType": "address", "name": "pair", "type": "address"}
        ],
        "stateMutability": "view",
        "type": "function"
    }
]
"#;

const PAIR_ABI: &str = r#"
[
    {
        "inputs": [],
        "name": "getReserves",
        "outputs": [
            {"internalType": "uint112", "name": "_reserve0", "type": "uint112"},
            {"internalType": "uint112", "name": "_reserve1", "type": "uint112"},
            {"internalType": "uint32", "name": "_blockTimestampLast", "type": "uint32"}
        ],
        "stateMutability": "view",
        "type": "function"
    }
]
"#;

pub struct UniswapV2Client {
    blockchain_client: Arc<BlockchainClient>,
    factory_contract: Contract<Provider<Http>>,
    pair_abi: Abi,
}

impl UniswapV2Client {
    pub fn new(blockchain_client: Arc<BlockchainClient>, factory_address: Address) -> Result<Self> {
        let factory_abi: Abi = serde_json::from_str(FACTORY_ABI)?;
        let pair_abi: Abi = serde_json::from_str(PAIR_ABI)?;

        let factory_contract = Contract::new(
            factory_address,
            factory_abi,
            blockchain_client.provider(),
        );

        Ok(Self {
            blockchain_client,
            factory_contract,
            pair_abi,
        })
    }

    pub async fn get_pair(&self, token_a: Address, token_b: Address) -> Result<Address> {
        let pair = self
            .factory_contract
            .method::<_, Address>("getPair", (token_a, token_b))?
            .call()
            .await
            .map_err(|e| anyhow!("Failed to get pair from factory: {}", e))?;

        if pair.is_zero() {
            return Err(anyhow!("No V2 pair for {:?}/{:?}", token_a, token_b));
        }
        Ok(pair)
    }
}

#[async_trait]
impl ReserveSource for UniswapV2Client {
    async fn get_pair_reserves(&self, token_a: Address, token_b: Address) -> Result<(U256, U256)> {
        let pair_address = self.get_pair(token_a, token_b).await?;
        let pair = Contract::new(
            pair_address,
            self.pair_abi.clone(),
            self.blockchain_client.provider(),
        );

        let (reserve0, reserve1, _timestamp) = pair
            .method::<_, (U256, U256, u32)>("getReserves", ())?
            .call()
            .await
            .map_err(|e| anyhow!("Failed to get reserves from {:?}: {}", pair_address, e))?;

        debug!(
            "Pair {:?} reserves: reserve0={}, reserve1={}",
            pair_address, reserve0, reserve1
        );

        Ok((reserve0, reserve1))
    }
}

const ROUTER_CALLS: &[&str] = &[
    "function swapExactETHForTokens(uint256 amountOutMin, address[] path, address to, uint256 deadline) payable returns (uint256[] amounts)",
    "function swapExactTokensForETH(uint256 amountIn, uint256 amountOutMin, address[] path, address to, uint256 deadline) returns (uint256[] amounts)",
];

const ERC20_CALLS: &[&str] = &["function approve(address spender, uint256 amount) returns (bool)"];

pub struct V2Calldata {
    router: BaseContract,
    erc20: BaseContract,
}

impl V2Calldata {
    pub fn new() -> Result<Self> {
        Ok(Self {
            router: BaseContract::from(abi::parse_abi(ROUTER_CALLS)?),
            erc20: BaseContract::from(abi::parse_abi(ERC20_CALLS)?),
        })
    }

    pub fn swap_exact_eth_for_tokens(
        &self,
        amount_out_min: U256,
        path: Vec<Address>,
        to: Address,
        deadline: U256,
    ) -> Result<Bytes> {
        self.router
            .encode("swapExactETHForTokens", (amount_out_min, path, to, deadline))
            .map_err(|e| anyhow!("Failed to encode swapExactETHForTokens: {}", e))
    }

    pub fn swap_exact_tokens_for_eth(
        &self,
        amount_in: U256,
        amount_out_min: U256,
        path: Vec<Address>,
        to: Address,
        deadline: U256,
    ) -> Result<Bytes> {
        self.router
            .encode(
                "swapExactTokensForETH",
                (amount_in, amount_out_min, path, to, deadline),
            )
            .map_err(|e| anyhow!("Failed to encode swapExactTokensForETH: {}", e))
    }

    pub fn approve(&self, spender: Address, amount: U256) -> Result<Bytes> {
        self.erc20
            .encode("approve", (spender, amount))
            .map_err(|e| anyhow!("Failed to encode approve: {}", e))
    }

    pub fn router(&self) -> &BaseContract {
        &self.router
    }

    pub fn erc20(&self) -> &BaseContract {
        &self.erc20
    }
}
