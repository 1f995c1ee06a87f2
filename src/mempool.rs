use anyhow::{anyhow, Result};
use ethers::{
    providers::{Middleware, Provider, Ws},
    types::H256,
};
use futures_util::StreamExt;
use std::{
    collections::{HashSet, VecDeque},
    time::Duration,
};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::bot::dispatcher::CandidateSender;

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub struct SeenCache {
    capacity: usize,
    hashes: HashSet<H256>,
    order: VecDeque<H256>,
}

impl SeenCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            hashes: HashSet::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    pub fn insert(&mut self, hash: H256) -> bool {
        if !self.hashes.insert(hash) {
            return false;
        }
        self.order.push_back(hash);
        if self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.hashes.remove(&oldest);
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

pub struct PendingTxFeed {
    ws_url: String,
    seen: SeenCache,
}

impl PendingTxFeed {
    pub fn new(ws_url: &str, seen_cache_size: usize) -> Self {
        Self {
            ws_url: ws_url.to_string(),
            seen: SeenCache::new(seen_cache_size),
        }
    }

    pub async fn run(mut self, sender: CandidateSender) -> Result<()> {
        loop {
            match self.stream_once(&sender).await {
                Ok(true) => {
                    warn!("Pending transaction stream ended, reconnecting");
                }
                Ok(false) => {
                    info!("Candidate queue closed, stopping mempool feed");
                    return Ok(());
                }
                Err(e) => {
                    error!("Mempool subscription failed: {}", e);
                }
            }
            sleep(RECONNECT_DELAY).await;
        }
    }

    // Ok(true) when the stream ended, Ok(false) when the consumer went away.
    async fn stream_once(&mut self, sender: &CandidateSender) -> Result<bool> {
        let provider = Provider::<Ws>::connect(&self.ws_url)
            .await
            .map_err(|e| anyhow!("Failed to connect to {}: {}", self.ws_url, e))?;
        let mut stream = provider
            .subscribe_pending_txs()
            .await
            .map_err(|e| anyhow!("Failed to subscribe to pending transactions: {}", e))?;

        info!("Subscribed to pending transactions on {}", self.ws_url);

        while let Some(tx_hash) = stream.next().await {
            if !self.seen.insert(tx_hash) {
                debug!("Skipping already seen {:?}", tx_hash);
                continue;
            }
            if !sender.offer(tx_hash) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seen_cache_deduplicates() {
        let mut cache = SeenCache::new(10);
        assert!(cache.insert(H256::repeat_byte(1)));
        assert!(!cache.insert(H256::repeat_byte(1)));
        assert!(cache.insert(H256::repeat_byte(2)));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_seen_cache_evicts_oldest() {
        let mut cache = SeenCache::new(2);
        assert!(cache.insert(H256::repeat_byte(1)));
        assert!(cache.insert(H256::repeat_byte(2)));
        assert!(cache.insert(H256::repeat_byte(3)));
        assert_eq!(cache.len(), 2);

        assert!(!cache.insert(H256::repeat_byte(3)));
        assert!(cache.insert(H256::repeat_byte(1)));
    }
}
