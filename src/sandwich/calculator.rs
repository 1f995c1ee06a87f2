use ethers::types::U256;
use tracing::debug;

use crate::{
    dex::amm::get_amount_out,
    error::{AmmError, PipelineError, Rejection},
    types::{OpportunityContext, ReservePair, SandwichLegs},
};

pub struct SandwichCalculator {
    front_run_amount: U256,
}

impl SandwichCalculator {
    pub fn new(front_run_amount: U256) -> Self {
        Self { front_run_amount }
    }

    pub fn simulate(
        &self,
        context: &OpportunityContext,
        reserves: &ReservePair,
    ) -> Result<SandwichLegs, PipelineError> {
        let front_run_amount_out = get_amount_out(
            self.front_run_amount,
            reserves.reserve_base,
            reserves.reserve_token,
        )?;

        let base_after_front_run = checked_add(reserves.reserve_base, self.front_run_amount)?;
        let token_after_front_run = checked_add(reserves.reserve_token, front_run_amount_out)?;

        let victim_amount_out = get_amount_out(
            context.amount_in,
            base_after_front_run,
            token_after_front_run,
        )?;

        if victim_amount_out < context.min_amount_out {
            return Err(Rejection::VictimSlippage {
                expected: victim_amount_out,
                minimum: context.min_amount_out,
            }
            .into());
        }

        let base_after_victim = checked_add(base_after_front_run, context.amount_in)?;
        let token_after_victim = checked_add(token_after_front_run, victim_amount_out)?;

        // Selling the captured tokens back: token side is the input reserve.
        let back_run_amount_out =
            get_amount_out(front_run_amount_out, token_after_victim, base_after_victim)?;

        debug!(
            "Sandwich legs: front-run out={}, victim out={}, back-run out={}",
            front_run_amount_out, victim_amount_out, back_run_amount_out
        );

        Ok(SandwichLegs {
            front_run_amount_in: self.front_run_amount,
            front_run_amount_out,
            victim_amount_out,
            back_run_amount_out,
        })
    }
}

fn checked_add(a: U256, b: U256) -> Result<U256, AmmError> {
    a.checked_add(b).ok_or(AmmError::Overflow)
}
