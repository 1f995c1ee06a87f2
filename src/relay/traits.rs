use anyhow::Result;
use async_trait::async_trait;
use ethers::types::{Address, H256, U64};

use crate::types::{Bundle, BundleResolution, BundleSubmission, SignedBundle, SimulationReport};

#[async_trait]
pub trait BundleSigner: Send + Sync {
    fn address(&self) -> Address;

    async fn sign_bundle(&self, bundle: &Bundle) -> Result<SignedBundle>;
}

#[async_trait]
pub trait RelaySubmitter: Send + Sync {
    async fn simulate(&self, bundle: &SignedBundle, target_block: U64) -> Result<SimulationReport>;

    async fn submit(&self, bundle: &SignedBundle, target_block: U64) -> Result<BundleSubmission>;

    async fn wait(&self, submission: &BundleSubmission) -> Result<BundleResolution>;

    async fn bundle_stats(&self, bundle_hash: H256, target_block: U64) -> Result<serde_json::Value>;

    async fn user_stats(&self, block: U64) -> Result<serde_json::Value>;
}
