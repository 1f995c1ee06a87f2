use anyhow::Result;
use ethers::types::{Address, Transaction, U256};
use tracing::debug;

use crate::{
    dex::universal_router::{decode_v2_swap_input, UniversalRouterDecoder, ROUTER_RECIPIENT_SENTINEL},
    error::{DecodeError, Rejection},
    types::OpportunityContext,
};

pub struct OpportunityFilter {
    universal_router: Address,
    weth: Address,
    decoder: UniversalRouterDecoder,
}

impl OpportunityFilter {
    pub fn new(universal_router: Address, weth: Address) -> Result<Self> {
        Ok(Self {
            universal_router,
            weth,
            decoder: UniversalRouterDecoder::new()?,
        })
    }

    pub fn evaluate(&self, transaction: &Transaction) -> Result<OpportunityContext, Rejection> {
        let to = transaction.to.ok_or(Rejection::MissingRecipient)?;

        if transaction.value.is_zero() {
            return Err(Rejection::ZeroValue);
        }

        // Addresses are compared as bytes, so checksum casing never matters.
        if to != self.universal_router {
            return Err(Rejection::WrongRouter(to));
        }

        let call = self
            .decoder
            .decode_call(&transaction.input)
            .map_err(Rejection::UnparseableRouterCall)?;

        let position = call.v2_swap_position().ok_or(Rejection::NoV2Swap)?;
        let input = call.v2_swap_input().ok_or_else(|| {
            Rejection::SwapDecode(DecodeError::Layout(format!(
                "no input for command at position {}",
                position
            )))
        })?;

        let swap = decode_v2_swap_input(input).map_err(Rejection::SwapDecode)?;

        if !swap.has_two_path {
            return Err(Rejection::NoTwoHopPath);
        }

        if swap.recipient == U256::from(ROUTER_RECIPIENT_SENTINEL) {
            return Err(Rejection::RouterRecipient);
        }

        if swap.path[0] != self.weth {
            return Err(Rejection::NotNativeInput(swap.path[0]));
        }

        debug!(
            "Candidate {:?}: {} wei into {:?}, min out {}",
            transaction.hash, transaction.value, swap.path[1], swap.min_amount_out
        );

        Ok(OpportunityContext {
            victim: transaction.clone(),
            amount_in: transaction.value,
            min_amount_out: swap.min_amount_out,
            token_to_capture: swap.path[1],
        })
    }
}
