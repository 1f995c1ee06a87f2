use anyhow::Result;
use ethers::types::{Address, Eip1559TransactionRequest, Transaction, U256};

use crate::{
    dex::V2Calldata,
    types::{Bundle, BundleEntry, OpportunityContext, SandwichLegs, SandwichPlan},
};

#[derive(Debug, Clone)]
pub struct BundleSettings {
    pub v2_router: Address,
    pub weth: Address,
    pub own_address: Address,
    pub chain_id: u64,
    pub bribe: U256,
    pub front_run_amount: U256,
    pub gas_limit: U256,
    pub deadline_secs: u64,
}

pub struct BundleBuilder {
    settings: BundleSettings,
    calldata: V2Calldata,
}

impl BundleBuilder {
    pub fn new(settings: BundleSettings) -> Result<Self> {
        Ok(Self {
            settings,
            calldata: V2Calldata::new()?,
        })
    }

    pub fn plan(&self, context: &OpportunityContext, legs: &SandwichLegs, now_unix: u64) -> SandwichPlan {
        let (max_fee_per_gas, max_priority_fee_per_gas) = self.bumped_fees(&context.victim);
        SandwichPlan {
            front_run_amount_out: legs.front_run_amount_out,
            back_run_min_amount_out: legs.back_run_amount_out,
            deadline: now_unix.saturating_add(self.settings.deadline_secs),
            max_fee_per_gas,
            max_priority_fee_per_gas,
        }
    }

    pub fn build(
        &self,
        context: &OpportunityContext,
        legs: &SandwichLegs,
        now_unix: u64,
    ) -> Result<Bundle> {
        let settings = &self.settings;
        let plan = self.plan(context, legs, now_unix);
        let deadline = U256::from(plan.deadline);
        let token = context.token_to_capture;

        let front_run = self.signable(
            settings.v2_router,
            settings.front_run_amount,
            self.calldata.swap_exact_eth_for_tokens(
                plan.front_run_amount_out,
                vec![settings.weth, token],
                settings.own_address,
                deadline,
            )?,
            &plan,
        );

        let victim = BundleEntry::Raw(self.victim_raw(&context.victim));

        let approval = self.signable(
            token,
            U256::zero(),
            self.calldata
                .approve(settings.v2_router, plan.front_run_amount_out)?,
            &plan,
        );

        let back_run = self.signable(
            settings.v2_router,
            U256::zero(),
            self.calldata.swap_exact_tokens_for_eth(
                plan.front_run_amount_out,
                plan.back_run_min_amount_out,
                vec![token, settings.weth],
                settings.own_address,
                deadline,
            )?,
            &plan,
        );

        Ok(Bundle::new(plan, front_run, victim, approval, back_run))
    }

    // Victim fee fields plus the bribe. Legacy transactions only carry a
    // gas price, which then stands in for both fields.
    fn bumped_fees(&self, victim: &Transaction) -> (U256, U256) {
        let max_fee = victim
            .max_fee_per_gas
            .or(victim.gas_price)
            .unwrap_or_default();
        let priority_fee = victim
            .max_priority_fee_per_gas
            .or(victim.gas_price)
            .unwrap_or_default();

        (
            max_fee.saturating_add(self.settings.bribe),
            priority_fee.saturating_add(self.settings.bribe),
        )
    }

    fn victim_raw(&self, victim: &Transaction) -> ethers::types::Bytes {
        if victim.chain_id.is_some() {
            return victim.rlp();
        }
        let mut victim = victim.clone();
        victim.chain_id = Some(U256::from(self.settings.chain_id));
        victim.rlp()
    }

    fn signable(
        &self,
        to: Address,
        value: U256,
        data: ethers::types::Bytes,
        plan: &SandwichPlan,
    ) -> BundleEntry {
        let transaction = Eip1559TransactionRequest::new()
            .from(self.settings.own_address)
            .to(to)
            .value(value)
            .data(data)
            .gas(self.settings.gas_limit)
            .max_fee_per_gas(plan.max_fee_per_gas)
            .max_priority_fee_per_gas(plan.max_priority_fee_per_gas)
            .chain_id(self.settings.chain_id);

        BundleEntry::Signable {
            signer: self.settings.own_address,
            transaction,
        }
    }
}
