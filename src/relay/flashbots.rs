use anyhow::{anyhow, Result};
use async_trait::async_trait;
use ethers::{
    signers::{LocalWallet, Signer},
    types::{Bytes, H256, U64},
    utils::keccak256,
};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::{
    blockchain::ChainClient,
    config::RelayConfig,
    relay::traits::RelaySubmitter,
    types::{BundleResolution, BundleSubmission, LegRevert, SignedBundle, SimulationReport},
};

const SIGNATURE_HEADER: &str = "X-Flashbots-Signature";
const SECONDS_PER_BLOCK: u64 = 12;

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a, P> {
    jsonrpc: &'a str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CallBundleResponse {
    #[serde(default)]
    pub results: Vec<CallBundleTxResult>,
    #[serde(default)]
    pub total_gas_used: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CallBundleTxResult {
    #[serde(default)]
    pub tx_hash: Option<H256>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub revert: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendBundleResponse {
    bundle_hash: H256,
}

pub(crate) fn first_revert(results: &[CallBundleTxResult]) -> Option<LegRevert> {
    results.iter().enumerate().find_map(|(leg, result)| {
        let reason = result.revert.clone().or_else(|| result.error.clone())?;
        Some(LegRevert {
            leg,
            tx_hash: result.tx_hash,
            reason,
        })
    })
}

pub struct FlashbotsRelay {
    client: Client,
    url: String,
    auth: LocalWallet,
    chain: Arc<dyn ChainClient>,
    poll_interval: Duration,
    max_wait_blocks: u64,
    next_id: AtomicU64,
}

impl FlashbotsRelay {
    pub fn new(config: &RelayConfig, auth: LocalWallet, chain: Arc<dyn ChainClient>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| anyhow!("Failed to build relay HTTP client: {}", e))?;

        info!(
            "Relay session for {} authenticated as {:?}",
            config.url,
            auth.address()
        );

        Ok(Self {
            client,
            url: config.url.clone(),
            auth,
            chain,
            poll_interval: Duration::from_millis(config.poll_interval_ms.max(100)),
            max_wait_blocks: config.max_wait_blocks.max(1),
            next_id: AtomicU64::new(1),
        })
    }

    async fn request<P, T>(&self, method: &str, params: P) -> Result<T>
    where
        P: Serialize + Send + Sync,
        T: DeserializeOwned + Send,
    {
        let body = serde_json::to_string(&JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        })?;

        let digest = format!("0x{}", hex::encode(keccak256(body.as_bytes())));
        let signature = self
            .auth
            .sign_message(digest)
            .await
            .map_err(|e| anyhow!("Failed to sign relay request: {}", e))?;

        let response: JsonRpcResponse<T> = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .header(SIGNATURE_HEADER, format!("{:?}:0x{}", self.auth.address(), signature))
            .body(body)
            .send()
            .await
            .map_err(|e| anyhow!("Relay request {} failed: {}", method, e))?
            .json()
            .await
            .map_err(|e| anyhow!("Relay response for {} unreadable: {}", method, e))?;

        if let Some(error) = response.error {
            return Err(anyhow!(
                "Relay {} error {}: {}",
                method,
                error.code,
                error.message
            ));
        }
        response
            .result
            .ok_or_else(|| anyhow!("Relay {} returned no result", method))
    }

    fn encode_txs(bundle: &SignedBundle) -> Vec<String> {
        bundle
            .raw_transactions
            .iter()
            .map(|raw: &Bytes| format!("0x{}", hex::encode(raw)))
            .collect()
    }

    async fn all_included(&self, tx_hashes: &[H256]) -> Result<bool> {
        for hash in tx_hashes {
            if self.chain.get_transaction_receipt(*hash).await?.is_none() {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl RelaySubmitter for FlashbotsRelay {
    async fn simulate(&self, bundle: &SignedBundle, target_block: U64) -> Result<SimulationReport> {
        let params = json!([{
            "txs": Self::encode_txs(bundle),
            "blockNumber": format!("{:#x}", target_block),
            "stateBlockNumber": "latest",
        }]);

        let response: CallBundleResponse = self.request("eth_callBundle", params).await?;
        debug!(
            "Simulated {} legs for block {}, gas used {:?}",
            response.results.len(),
            target_block,
            response.total_gas_used
        );

        Ok(SimulationReport {
            first_revert: first_revert(&response.results),
            total_gas_used: response.total_gas_used.unwrap_or_default(),
        })
    }

    async fn submit(&self, bundle: &SignedBundle, target_block: U64) -> Result<BundleSubmission> {
        let params = json!([{
            "txs": Self::encode_txs(bundle),
            "blockNumber": format!("{:#x}", target_block),
        }]);

        let response: SendBundleResponse = self.request("eth_sendBundle", params).await?;

        Ok(BundleSubmission {
            bundle_hash: response.bundle_hash,
            target_block,
            tx_hashes: bundle.tx_hashes.clone(),
            signer: bundle.signer,
            first_nonce: bundle.first_nonce,
        })
    }

    async fn wait(&self, submission: &BundleSubmission) -> Result<BundleResolution> {
        let deadline =
            Instant::now() + Duration::from_secs(SECONDS_PER_BLOCK * self.max_wait_blocks);

        loop {
            let block = self.chain.get_block_number().await?;
            if block >= submission.target_block {
                break;
            }
            if Instant::now() >= deadline {
                warn!(
                    "Chain still at block {} while waiting for {}",
                    block, submission.target_block
                );
                break;
            }
            sleep(self.poll_interval).await;
        }

        if self.all_included(&submission.tx_hashes).await? {
            return Ok(BundleResolution::Included);
        }

        let nonce = self.chain.get_transaction_count(submission.signer).await?;
        if nonce > submission.first_nonce {
            return Ok(BundleResolution::AccountNonceTooHigh);
        }

        Ok(BundleResolution::BlockPassedWithoutInclusion)
    }

    async fn bundle_stats(&self, bundle_hash: H256, target_block: U64) -> Result<serde_json::Value> {
        let params = json!([{
            "bundleHash": bundle_hash,
            "blockNumber": format!("{:#x}", target_block),
        }]);
        self.request("flashbots_getBundleStatsV2", params).await
    }

    async fn user_stats(&self, block: U64) -> Result<serde_json::Value> {
        let params = json!([{ "blockNumber": format!("{:#x}", block) }]);
        self.request("flashbots_getUserStatsV2", params).await
    }
}
