use ethers::types::H256;
use std::sync::Arc;
use tokio::sync::{
    mpsc::{self, error::TrySendError},
    Semaphore,
};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::{
    bot::{metrics::BotMetrics, pipeline::SandwichPipeline},
    error::PipelineError,
    types::SandwichOutcome,
};

pub fn candidate_queue(
    capacity: usize,
    metrics: Arc<BotMetrics>,
) -> (CandidateSender, mpsc::Receiver<H256>) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (CandidateSender { sender, metrics }, receiver)
}

#[derive(Clone)]
pub struct CandidateSender {
    sender: mpsc::Sender<H256>,
    metrics: Arc<BotMetrics>,
}

impl CandidateSender {
    pub fn offer(&self, tx_hash: H256) -> bool {
        self.metrics.record_seen();
        match self.sender.try_send(tx_hash) {
            Ok(()) => true,
            Err(TrySendError::Full(hash)) => {
                self.metrics.record_dropped();
                debug!("Candidate queue full, dropping {:?}", hash);
                true
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

pub struct Dispatcher {
    pipeline: Arc<SandwichPipeline>,
    permits: Arc<Semaphore>,
}

impl Dispatcher {
    pub fn new(pipeline: Arc<SandwichPipeline>, max_in_flight: usize) -> Self {
        Self {
            pipeline,
            permits: Arc::new(Semaphore::new(max_in_flight.max(1))),
        }
    }

    pub async fn run(&self, mut receiver: mpsc::Receiver<H256>) {
        info!("Dispatcher started");

        while let Some(tx_hash) = receiver.recv().await {
            let permit = match self.permits.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let pipeline = self.pipeline.clone();
            let span = info_span!("candidate", tx = ?tx_hash, run = %Uuid::new_v4());

            tokio::spawn(
                async move {
                    let result = pipeline.process(tx_hash).await;
                    log_result(&result);
                    pipeline.metrics().record_result(&result);
                    drop(permit);
                }
                .instrument(span),
            );
        }

        info!("Candidate queue closed, dispatcher stopping");
    }

    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }
}

fn log_result(result: &Result<SandwichOutcome, PipelineError>) {
    match result {
        Ok(outcome) => info!("Run finished: {:?}", outcome),
        Err(PipelineError::NotAnOpportunity(rejection)) => match rejection.category() {
            "reserves" => warn!("Candidate skipped: {}", rejection),
            _ => debug!("Not an opportunity: {}", rejection),
        },
        Err(PipelineError::Internal(e)) => error!("Run failed: {:#}", e),
    }
}
