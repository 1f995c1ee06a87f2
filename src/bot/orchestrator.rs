use anyhow::{anyhow, Result};
use ethers::{signers::LocalWallet, types::U256};
use std::{sync::Arc, time::Duration};
use tokio::{task::JoinHandle, time::interval};
use tracing::{error, info};

use crate::{
    blockchain::{BlockchainClient, ChainClient},
    bot::{
        dispatcher::{candidate_queue, Dispatcher},
        metrics::BotMetrics,
        pipeline::{PipelineDeps, SandwichPipeline},
    },
    config::Config,
    dex::UniswapV2Client,
    mempool::PendingTxFeed,
    relay::{BundleSigner, FlashbotsRelay, WalletBundleSigner},
    sandwich::{BundleBuilder, BundleSettings, OpportunityFilter, SandwichCalculator},
};

pub struct SandwichBot {
    config: Config,
    blockchain_client: Arc<BlockchainClient>,
    pipeline: Arc<SandwichPipeline>,
    metrics: Arc<BotMetrics>,
    tasks: Vec<JoinHandle<()>>,
    is_running: bool,
}

fn parse_wallet(key: &str, what: &str) -> Result<LocalWallet> {
    key.trim()
        .parse::<LocalWallet>()
        .map_err(|e| anyhow!("Invalid {}: {}", what, e))
}

impl SandwichBot {
    pub async fn new(config: Config) -> Result<Self> {
        info!("Initializing sandwich bot");

        let blockchain_client = Arc::new(BlockchainClient::new(&config).await?);
        let chain: Arc<dyn ChainClient> = blockchain_client.clone();
        info!("Blockchain client initialized");

        let addresses = config.contract_addresses()?;
        let reserves = Arc::new(UniswapV2Client::new(
            blockchain_client.clone(),
            addresses.v2_factory,
        )?);

        let wallet = parse_wallet(&config.wallet.private_key, "wallet.private_key")?;
        let auth = match &config.wallet.relay_auth_key {
            Some(key) => parse_wallet(key, "wallet.relay_auth_key")?,
            None => wallet.clone(),
        };

        let signer = Arc::new(WalletBundleSigner::new(
            wallet,
            config.blockchain.chain_id,
            chain.clone(),
        ));
        let relay = Arc::new(FlashbotsRelay::new(&config.relay, auth, chain.clone())?);
        info!("Trading as {:?}", signer.address());

        let front_run_amount = config.front_run_amount()?;
        let builder = BundleBuilder::new(BundleSettings {
            v2_router: addresses.v2_router,
            weth: addresses.weth,
            own_address: signer.address(),
            chain_id: config.blockchain.chain_id,
            bribe: config.bribe()?,
            front_run_amount,
            gas_limit: U256::from(config.sandwich.gas_limit),
            deadline_secs: config.sandwich.deadline_secs,
        })?;

        let metrics = Arc::new(BotMetrics::new());
        let pipeline = Arc::new(SandwichPipeline::new(
            PipelineDeps {
                chain,
                reserves,
                signer,
                relay,
                metrics: metrics.clone(),
            },
            addresses.weth,
            OpportunityFilter::new(addresses.universal_router, addresses.weth)?,
            SandwichCalculator::new(front_run_amount),
            builder,
        ));

        info!("Sandwich bot initialized successfully");

        Ok(Self {
            config,
            blockchain_client,
            pipeline,
            metrics,
            tasks: Vec::new(),
            is_running: false,
        })
    }

    pub async fn start(&mut self) -> Result<()> {
        if self.is_running {
            return Err(anyhow!("Bot is already running"));
        }

        info!("Starting sandwich bot");
        self.is_running = true;

        self.blockchain_client
            .health_check()
            .await
            .map_err(|e| anyhow!("Blockchain health check failed: {}", e))?;

        let settings = &self.config.sandwich;
        let (sender, receiver) = candidate_queue(settings.queue_capacity, self.metrics.clone());

        let feed = PendingTxFeed::new(&self.config.blockchain.ws_rpc_url, settings.seen_cache_size);
        self.tasks.push(tokio::spawn(async move {
            if let Err(e) = feed.run(sender).await {
                error!("Mempool feed stopped: {}", e);
            }
        }));

        let metrics = self.metrics.clone();
        let period = Duration::from_secs(settings.metrics_interval_secs.max(1));
        self.tasks.push(tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                metrics.log_summary();
            }
        }));

        info!(
            "Watching mempool with up to {} concurrent runs",
            settings.max_in_flight
        );
        Dispatcher::new(self.pipeline.clone(), settings.max_in_flight)
            .run(receiver)
            .await;

        Ok(())
    }

    pub async fn stop(&mut self) {
        info!("Stopping sandwich bot");
        self.is_running = false;
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.metrics.log_summary();
    }
}
