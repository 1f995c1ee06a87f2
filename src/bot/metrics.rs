use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

use crate::{
    error::{PipelineError, Rejection},
    types::SandwichOutcome,
};

#[derive(Debug)]
pub struct BotMetrics {
    started_at: DateTime<Utc>,
    candidates_seen: AtomicU64,
    candidates_dropped: AtomicU64,
    rejected_lookup: AtomicU64,
    rejected_shape: AtomicU64,
    rejected_decode: AtomicU64,
    rejected_reserves: AtomicU64,
    rejected_economic: AtomicU64,
    opportunities: AtomicU64,
    simulation_reverts: AtomicU64,
    bundles_submitted: AtomicU64,
    bundles_included: AtomicU64,
    bundles_already_mined: AtomicU64,
    bundles_not_included: AtomicU64,
    internal_errors: AtomicU64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub uptime_seconds: u64,
    pub candidates_seen: u64,
    pub candidates_dropped: u64,
    pub rejected_lookup: u64,
    pub rejected_shape: u64,
    pub rejected_decode: u64,
    pub rejected_reserves: u64,
    pub rejected_economic: u64,
    pub opportunities: u64,
    pub simulation_reverts: u64,
    pub bundles_submitted: u64,
    pub bundles_included: u64,
    pub bundles_already_mined: u64,
    pub bundles_not_included: u64,
    pub internal_errors: u64,
}

impl BotMetrics {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            candidates_seen: AtomicU64::new(0),
            candidates_dropped: AtomicU64::new(0),
            rejected_lookup: AtomicU64::new(0),
            rejected_shape: AtomicU64::new(0),
            rejected_decode: AtomicU64::new(0),
            rejected_reserves: AtomicU64::new(0),
            rejected_economic: AtomicU64::new(0),
            opportunities: AtomicU64::new(0),
            simulation_reverts: AtomicU64::new(0),
            bundles_submitted: AtomicU64::new(0),
            bundles_included: AtomicU64::new(0),
            bundles_already_mined: AtomicU64::new(0),
            bundles_not_included: AtomicU64::new(0),
            internal_errors: AtomicU64::new(0),
        }
    }

    pub fn record_seen(&self) {
        self.candidates_seen.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.candidates_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_opportunity(&self) {
        self.opportunities.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_submitted(&self) {
        self.bundles_submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejection(&self, rejection: &Rejection) {
        let counter = match rejection.category() {
            "lookup" => &self.rejected_lookup,
            "decode" => &self.rejected_decode,
            "reserves" => &self.rejected_reserves,
            "economic" => &self.rejected_economic,
            _ => &self.rejected_shape,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_result(&self, result: &Result<SandwichOutcome, PipelineError>) {
        let counter = match result {
            Ok(SandwichOutcome::SimulationReverted { .. }) => &self.simulation_reverts,
            Ok(SandwichOutcome::Included { .. }) => &self.bundles_included,
            Ok(SandwichOutcome::AlreadyMined { .. }) => &self.bundles_already_mined,
            Ok(SandwichOutcome::NotIncluded { .. }) => &self.bundles_not_included,
            Err(PipelineError::NotAnOpportunity(rejection)) => {
                self.record_rejection(rejection);
                return;
            }
            Err(PipelineError::Internal(_)) => &self.internal_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        MetricsSnapshot {
            uptime_seconds: (Utc::now() - self.started_at).num_seconds().max(0) as u64,
            candidates_seen: load(&self.candidates_seen),
            candidates_dropped: load(&self.candidates_dropped),
            rejected_lookup: load(&self.rejected_lookup),
            rejected_shape: load(&self.rejected_shape),
            rejected_decode: load(&self.rejected_decode),
            rejected_reserves: load(&self.rejected_reserves),
            rejected_economic: load(&self.rejected_economic),
            opportunities: load(&self.opportunities),
            simulation_reverts: load(&self.simulation_reverts),
            bundles_submitted: load(&self.bundles_submitted),
            bundles_included: load(&self.bundles_included),
            bundles_already_mined: load(&self.bundles_already_mined),
            bundles_not_included: load(&self.bundles_not_included),
            internal_errors: load(&self.internal_errors),
        }
    }

    pub fn log_summary(&self) {
        let s = self.snapshot();
        info!(
            "Metrics: uptime={}s seen={} dropped={} rejected[lookup={} shape={} decode={} reserves={} economic={}] opportunities={} reverts={} submitted={} included={} already_mined={} missed={} internal_errors={}",
            s.uptime_seconds,
            s.candidates_seen,
            s.candidates_dropped,
            s.rejected_lookup,
            s.rejected_shape,
            s.rejected_decode,
            s.rejected_reserves,
            s.rejected_economic,
            s.opportunities,
            s.simulation_reverts,
            s.bundles_submitted,
            s.bundles_included,
            s.bundles_already_mined,
            s.bundles_not_included,
            s.internal_errors
        );
    }
}

impl Default for BotMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::{H256, U256};

    #[test]
    fn test_results_land_in_buckets() {
        let metrics = BotMetrics::new();

        metrics.record_result(&Err(Rejection::ZeroValue.into()));
        metrics.record_result(&Err(Rejection::VictimSlippage {
            expected: U256::one(),
            minimum: U256::from(2),
        }
        .into()));
        metrics.record_result(&Err(PipelineError::Internal(anyhow::anyhow!("boom"))));
        metrics.record_result(&Ok(SandwichOutcome::SimulationReverted {
            leg: 2,
            reason: "revert".to_string(),
        }));
        metrics.record_result(&Ok(SandwichOutcome::Included {
            bundle_hash: H256::zero(),
        }));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.rejected_shape, 1);
        assert_eq!(snapshot.rejected_economic, 1);
        assert_eq!(snapshot.internal_errors, 1);
        assert_eq!(snapshot.simulation_reverts, 1);
        assert_eq!(snapshot.bundles_included, 1);
        assert_eq!(snapshot.bundles_not_included, 0);
    }
}
