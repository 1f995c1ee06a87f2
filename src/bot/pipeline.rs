use chrono::Utc;
use ethers::types::{Address, Transaction, H256, U64};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    blockchain::{wei_to_ether, ChainClient},
    bot::metrics::BotMetrics,
    dex::traits::ReserveSource,
    error::{PipelineError, Rejection},
    relay::traits::{BundleSigner, RelaySubmitter},
    sandwich::{BundleBuilder, OpportunityFilter, SandwichCalculator},
    types::{leg_name, BundleResolution, BundleSubmission, ReservePair, SandwichOutcome},
};

pub struct PipelineDeps {
    pub chain: Arc<dyn ChainClient>,
    pub reserves: Arc<dyn ReserveSource>,
    pub signer: Arc<dyn BundleSigner>,
    pub relay: Arc<dyn RelaySubmitter>,
    pub metrics: Arc<BotMetrics>,
}

pub struct SandwichPipeline {
    deps: PipelineDeps,
    weth: Address,
    filter: OpportunityFilter,
    calculator: SandwichCalculator,
    builder: BundleBuilder,
}

impl SandwichPipeline {
    pub fn new(
        deps: PipelineDeps,
        weth: Address,
        filter: OpportunityFilter,
        calculator: SandwichCalculator,
        builder: BundleBuilder,
    ) -> Self {
        Self {
            deps,
            weth,
            filter,
            calculator,
            builder,
        }
    }

    pub fn metrics(&self) -> &Arc<BotMetrics> {
        &self.deps.metrics
    }

    pub async fn process(&self, tx_hash: H256) -> Result<SandwichOutcome, PipelineError> {
        let victim = match self.deps.chain.get_transaction(tx_hash).await {
            Ok(Some(transaction)) => transaction,
            Ok(None) => return Err(Rejection::TransactionNotFound(tx_hash).into()),
            Err(e) => return Err(Rejection::TransactionLookup(e.to_string()).into()),
        };
        self.process_transaction(victim).await
    }

    pub async fn process_transaction(
        &self,
        victim: Transaction,
    ) -> Result<SandwichOutcome, PipelineError> {
        let context = self.filter.evaluate(&victim)?;
        let token = context.token_to_capture;

        let (reserve0, reserve1) = self
            .deps
            .reserves
            .get_pair_reserves(self.weth, token)
            .await
            .map_err(|e| Rejection::ReserveLookup(e.to_string()))?;
        let reserves = ReservePair::from_pool_reserves(self.weth, token, reserve0, reserve1);

        let legs = self.calculator.simulate(&context, &reserves)?;
        self.deps.metrics.record_opportunity();

        info!(
            "Opportunity {:?}: victim {:.4} ETH into {:?}, expected profit {} ETH before gas",
            victim.hash,
            wei_to_ether(context.amount_in),
            token,
            legs.estimated_profit_ether()
        );

        let now = Utc::now().timestamp().max(0) as u64;
        let bundle = self.builder.build(&context, &legs, now)?;
        let signed = self.deps.signer.sign_bundle(&bundle).await?;

        let block = self.deps.chain.get_block_number().await?;
        let target_block = block + U64::one();

        debug!("Simulating bundle for block {}", target_block);
        let simulation = self.deps.relay.simulate(&signed, target_block).await?;
        if let Some(revert) = simulation.first_revert {
            warn!(
                "Simulation reverted on leg {} ({}): {}",
                revert.leg,
                leg_name(revert.leg),
                revert.reason
            );
            return Ok(SandwichOutcome::SimulationReverted {
                leg: revert.leg,
                reason: revert.reason,
            });
        }

        let submission = self.deps.relay.submit(&signed, target_block).await?;
        self.deps.metrics.record_submitted();
        info!(
            "Bundle {:?} submitted for block {}",
            submission.bundle_hash, target_block
        );

        let resolution = self.deps.relay.wait(&submission).await?;
        Ok(self.resolve(submission, resolution).await)
    }

    async fn resolve(
        &self,
        submission: BundleSubmission,
        resolution: BundleResolution,
    ) -> SandwichOutcome {
        let bundle_hash = submission.bundle_hash;
        match resolution {
            BundleResolution::Included => {
                info!("Bundle {:?} included in block {}", bundle_hash, submission.target_block);
                SandwichOutcome::Included { bundle_hash }
            }
            BundleResolution::AccountNonceTooHigh => {
                info!("Bundle {:?} superseded: transactions already mined", bundle_hash);
                SandwichOutcome::AlreadyMined { bundle_hash }
            }
            BundleResolution::BlockPassedWithoutInclusion => {
                warn!(
                    "Bundle {:?} not included in block {}",
                    bundle_hash, submission.target_block
                );
                let stats = self.diagnostics(&submission).await;
                SandwichOutcome::NotIncluded { bundle_hash, stats }
            }
        }
    }

    async fn diagnostics(&self, submission: &BundleSubmission) -> Option<serde_json::Value> {
        let relay = &self.deps.relay;
        let bundle_stats = relay
            .bundle_stats(submission.bundle_hash, submission.target_block)
            .await;
        let user_stats = relay.user_stats(submission.target_block).await;

        match (bundle_stats, user_stats) {
            (Ok(bundle_stats), Ok(user_stats)) => {
                let stats = json!({ "bundleStats": bundle_stats, "userStats": user_stats });
                info!("Relay stats for {:?}: {}", submission.bundle_hash, stats);
                Some(stats)
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!("Could not fetch relay stats for {:?}: {}", submission.bundle_hash, e);
                None
            }
        }
    }
}
