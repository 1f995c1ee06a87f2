use anyhow::Result;
use async_trait::async_trait;
use ethers::types::{Address, U256};

#[async_trait]
pub trait ReserveSource: Send + Sync {
    // Returns `(reserve0, reserve1)` as stored by the pair, i.e. ordered by
    // ascending token address.
    async fn get_pair_reserves(&self, token_a: Address, token_b: Address) -> Result<(U256, U256)>;
}
