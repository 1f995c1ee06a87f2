use anyhow::{anyhow, Result};
use async_trait::async_trait;
use ethers::{
    signers::{LocalWallet, Signer},
    types::{Address, Bytes, Transaction, TransactionReceipt, H256, U256, U64},
};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use crate::{
    blockchain::ChainClient,
    dex::{
        traits::ReserveSource,
        universal_router::tests::{pepe, weth},
    },
    relay::traits::RelaySubmitter,
    sandwich::BundleSettings,
    types::{
        BundleResolution, BundleSubmission, OpportunityContext, SandwichLegs, SignedBundle,
        SimulationReport,
    },
};

pub fn universal_router() -> Address {
    "0x3fC91A3afd70395Cd496C647d5a6CC9D4B2b7FAD".parse().unwrap()
}

pub fn v2_router() -> Address {
    "0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D".parse().unwrap()
}

pub fn test_wallet() -> LocalWallet {
    "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318"
        .parse()
        .unwrap()
}

pub fn victim_transaction(to: Option<Address>, value: U256, input: Bytes) -> Transaction {
    Transaction {
        hash: H256::repeat_byte(0xaa),
        nonce: U256::from(7),
        from: Address::from_low_u64_be(0x1234),
        to,
        value,
        gas: U256::from(250_000),
        gas_price: Some(U256::from(35_000_000_000u64)),
        input,
        v: U64::from(1),
        r: U256::from(0x1111),
        s: U256::from(0x2222),
        transaction_type: Some(U64::from(2)),
        access_list: Some(Default::default()),
        max_fee_per_gas: Some(U256::from(40_000_000_000u64)),
        max_priority_fee_per_gas: Some(U256::from(2_000_000_000u64)),
        chain_id: Some(U256::from(1)),
        ..Default::default()
    }
}

pub fn opportunity(amount_in: U256, min_amount_out: U256) -> OpportunityContext {
    OpportunityContext {
        victim: victim_transaction(Some(universal_router()), amount_in, Bytes::default()),
        amount_in,
        min_amount_out,
        token_to_capture: pepe(),
    }
}

pub fn sample_legs() -> SandwichLegs {
    SandwichLegs {
        front_run_amount_in: U256::exp10(17),
        front_run_amount_out: U256::from_dec_str("199398012001820341").unwrap(),
        victim_amount_out: U256::from_dec_str("1993801159994545179").unwrap(),
        back_run_amount_out: U256::from_dec_str("99398954862913790").unwrap(),
    }
}

pub fn bundle_settings() -> BundleSettings {
    BundleSettings {
        v2_router: v2_router(),
        weth: weth(),
        own_address: test_wallet().address(),
        chain_id: 1,
        bribe: U256::from(20_000_000_000u64),
        front_run_amount: U256::exp10(17),
        gas_limit: U256::from(300_000),
        deadline_secs: 3600,
    }
}

#[derive(Default)]
pub struct FakeChain {
    transactions: HashMap<H256, Transaction>,
    receipts: HashMap<H256, TransactionReceipt>,
    block: U64,
    nonce: U256,
    fail_lookups: bool,
}

impl FakeChain {
    pub fn with_transaction(mut self, transaction: Transaction) -> Self {
        self.transactions.insert(transaction.hash, transaction);
        self
    }

    pub fn with_receipt(mut self, hash: H256, receipt: TransactionReceipt) -> Self {
        self.receipts.insert(hash, receipt);
        self
    }

    pub fn with_block(mut self, block: U64) -> Self {
        self.block = block;
        self
    }

    pub fn with_nonce(mut self, nonce: U256) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn with_failing_lookups(mut self) -> Self {
        self.fail_lookups = true;
        self
    }
}

#[async_trait]
impl ChainClient for FakeChain {
    async fn get_transaction(&self, hash: H256) -> Result<Option<Transaction>> {
        if self.fail_lookups {
            return Err(anyhow!("node unavailable"));
        }
        Ok(self.transactions.get(&hash).cloned())
    }

    async fn get_block_number(&self) -> Result<U64> {
        Ok(self.block)
    }

    async fn get_transaction_count(&self, _address: Address) -> Result<U256> {
        Ok(self.nonce)
    }

    async fn get_transaction_receipt(&self, hash: H256) -> Result<Option<TransactionReceipt>> {
        Ok(self.receipts.get(&hash).cloned())
    }
}

pub struct FakeReserves {
    pub reserves: Option<(U256, U256)>,
}

#[async_trait]
impl ReserveSource for FakeReserves {
    async fn get_pair_reserves(&self, _token_a: Address, _token_b: Address) -> Result<(U256, U256)> {
        self.reserves.ok_or_else(|| anyhow!("pair missing"))
    }
}

pub struct FakeRelay {
    pub simulation: SimulationReport,
    pub resolution: BundleResolution,
    pub stats_available: bool,
    pub simulated: AtomicUsize,
    pub submitted: AtomicUsize,
    pub stats_requested: AtomicUsize,
    pub last_bundle: Mutex<Option<SignedBundle>>,
}

impl FakeRelay {
    pub fn new(simulation: SimulationReport, resolution: BundleResolution) -> Self {
        Self {
            simulation,
            resolution,
            stats_available: true,
            simulated: AtomicUsize::new(0),
            submitted: AtomicUsize::new(0),
            stats_requested: AtomicUsize::new(0),
            last_bundle: Mutex::new(None),
        }
    }
}

#[async_trait]
impl RelaySubmitter for FakeRelay {
    async fn simulate(&self, bundle: &SignedBundle, _target_block: U64) -> Result<SimulationReport> {
        self.simulated.fetch_add(1, Ordering::SeqCst);
        *self.last_bundle.lock().unwrap() = Some(bundle.clone());
        Ok(self.simulation.clone())
    }

    async fn submit(&self, bundle: &SignedBundle, target_block: U64) -> Result<BundleSubmission> {
        self.submitted.fetch_add(1, Ordering::SeqCst);
        Ok(BundleSubmission {
            bundle_hash: H256::repeat_byte(0xbb),
            target_block,
            tx_hashes: bundle.tx_hashes.clone(),
            signer: bundle.signer,
            first_nonce: bundle.first_nonce,
        })
    }

    async fn wait(&self, _submission: &BundleSubmission) -> Result<BundleResolution> {
        Ok(self.resolution)
    }

    async fn bundle_stats(&self, _bundle_hash: H256, _target_block: U64) -> Result<serde_json::Value> {
        self.stats_requested.fetch_add(1, Ordering::SeqCst);
        if self.stats_available {
            Ok(serde_json::json!({ "isSimulated": true }))
        } else {
            Err(anyhow!("stats endpoint down"))
        }
    }

    async fn user_stats(&self, _block: U64) -> Result<serde_json::Value> {
        if self.stats_available {
            Ok(serde_json::json!({ "isHighPriority": false }))
        } else {
            Err(anyhow!("stats endpoint down"))
        }
    }
}
