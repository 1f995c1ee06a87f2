use bigdecimal::BigDecimal;
use ethers::types::{Address, Bytes, Eip1559TransactionRequest, Transaction, H256, U256, U64};
use serde::{Deserialize, Serialize};

use crate::blockchain::wei_to_ether_decimal;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedSwap {
    // Recipient word interpreted as an integer, so router sentinels stay visible.
    pub recipient: U256,
    pub amount_in: U256,
    pub min_amount_out: U256,
    pub path: Vec<Address>,
    pub has_two_path: bool,
}

#[derive(Debug, Clone)]
pub struct OpportunityContext {
    pub victim: Transaction,
    pub amount_in: U256,
    pub min_amount_out: U256,
    pub token_to_capture: Address,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservePair {
    pub reserve_base: U256,
    pub reserve_token: U256,
}

impl ReservePair {
    pub fn new(reserve_base: U256, reserve_token: U256) -> Self {
        Self {
            reserve_base,
            reserve_token,
        }
    }

    pub fn from_pool_reserves(
        base: Address,
        token: Address,
        reserve0: U256,
        reserve1: U256,
    ) -> Self {
        if base < token {
            Self::new(reserve0, reserve1)
        } else {
            Self::new(reserve1, reserve0)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandwichLegs {
    pub front_run_amount_in: U256,
    pub front_run_amount_out: U256,
    pub victim_amount_out: U256,
    pub back_run_amount_out: U256,
}

impl SandwichLegs {
    pub fn estimated_profit_ether(&self) -> BigDecimal {
        wei_to_ether_decimal(self.back_run_amount_out)
            - wei_to_ether_decimal(self.front_run_amount_in)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandwichPlan {
    pub front_run_amount_out: U256,
    pub back_run_min_amount_out: U256,
    pub deadline: u64,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BundleEntry {
    Signable {
        signer: Address,
        transaction: Eip1559TransactionRequest,
    },
    Raw(Bytes),
}

impl BundleEntry {
    pub fn as_signable(&self) -> Option<&Eip1559TransactionRequest> {
        match self {
            BundleEntry::Signable { transaction, .. } => Some(transaction),
            BundleEntry::Raw(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
    pub plan: SandwichPlan,
    entries: [BundleEntry; 4],
}

impl Bundle {
    pub const FRONT_RUN: usize = 0;
    pub const VICTIM: usize = 1;
    pub const APPROVAL: usize = 2;
    pub const BACK_RUN: usize = 3;

    pub fn new(
        plan: SandwichPlan,
        front_run: BundleEntry,
        victim: BundleEntry,
        approval: BundleEntry,
        back_run: BundleEntry,
    ) -> Self {
        Self {
            plan,
            entries: [front_run, victim, approval, back_run],
        }
    }

    pub fn entries(&self) -> &[BundleEntry; 4] {
        &self.entries
    }

    pub fn front_run(&self) -> &BundleEntry {
        &self.entries[Self::FRONT_RUN]
    }

    pub fn victim(&self) -> &BundleEntry {
        &self.entries[Self::VICTIM]
    }

    pub fn approval(&self) -> &BundleEntry {
        &self.entries[Self::APPROVAL]
    }

    pub fn back_run(&self) -> &BundleEntry {
        &self.entries[Self::BACK_RUN]
    }
}

pub fn leg_name(index: usize) -> &'static str {
    match index {
        Bundle::FRONT_RUN => "front-run",
        Bundle::VICTIM => "victim",
        Bundle::APPROVAL => "approval",
        Bundle::BACK_RUN => "back-run",
        _ => "unknown",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignedBundle {
    pub raw_transactions: Vec<Bytes>,
    pub tx_hashes: Vec<H256>,
    pub signer: Address,
    pub first_nonce: U256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegRevert {
    pub leg: usize,
    pub tx_hash: Option<H256>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationReport {
    pub first_revert: Option<LegRevert>,
    pub total_gas_used: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BundleSubmission {
    pub bundle_hash: H256,
    pub target_block: U64,
    pub tx_hashes: Vec<H256>,
    pub signer: Address,
    pub first_nonce: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleResolution {
    Included,
    AccountNonceTooHigh,
    BlockPassedWithoutInclusion,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SandwichOutcome {
    SimulationReverted { leg: usize, reason: String },
    Included { bundle_hash: H256 },
    AlreadyMined { bundle_hash: H256 },
    NotIncluded {
        bundle_hash: H256,
        stats: Option<serde_json::Value>,
    },
}
