use ethers::types::{Address, H256, U256};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("calldata shorter than a function selector")]
    MissingSelector,

    #[error("unknown router function selector 0x{0}")]
    UnknownSelector(String),

    #[error("abi decode failed: {0}")]
    Abi(String),

    #[error("unexpected token layout: {0}")]
    Layout(String),

    #[error("swap input is not word aligned ({0} bytes)")]
    Misaligned(usize),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("transaction {0:?} not found")]
    TransactionNotFound(H256),

    #[error("transaction lookup failed: {0}")]
    TransactionLookup(String),

    #[error("transaction has no recipient")]
    MissingRecipient,

    #[error("transaction carries no native value")]
    ZeroValue,

    #[error("transaction targets {0:?}, not the universal router")]
    WrongRouter(Address),

    #[error("router call could not be parsed: {0}")]
    UnparseableRouterCall(DecodeError),

    #[error("command sequence has no V2 exact-in swap")]
    NoV2Swap,

    #[error("V2 swap input could not be decoded: {0}")]
    SwapDecode(DecodeError),

    #[error("swap path is not a two-hop path")]
    NoTwoHopPath,

    #[error("swap recipient is the router itself")]
    RouterRecipient,

    #[error("swap input token {0:?} is not the wrapped native asset")]
    NotNativeInput(Address),

    #[error("reserve lookup failed: {0}")]
    ReserveLookup(String),

    #[error("pool has no liquidity")]
    EmptyPool,

    #[error("victim would receive {expected} but requires at least {minimum}")]
    VictimSlippage { expected: U256, minimum: U256 },
}

impl Rejection {
    pub fn category(&self) -> &'static str {
        match self {
            Rejection::TransactionNotFound(_) | Rejection::TransactionLookup(_) => "lookup",
            Rejection::ReserveLookup(_) | Rejection::EmptyPool => "reserves",
            Rejection::UnparseableRouterCall(_) | Rejection::SwapDecode(_) => "decode",
            Rejection::VictimSlippage { .. } => "economic",
            _ => "shape",
        }
    }
}

#[derive(Debug, Error)]
pub enum AmmError {
    #[error("insufficient liquidity")]
    InsufficientLiquidity,

    #[error("arithmetic overflow in amount-out calculation")]
    Overflow,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("not an opportunity: {0}")]
    NotAnOpportunity(#[from] Rejection),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

// An empty pool is market state; only overflow means the math itself broke.
impl From<AmmError> for PipelineError {
    fn from(err: AmmError) -> Self {
        match err {
            AmmError::InsufficientLiquidity => PipelineError::NotAnOpportunity(Rejection::EmptyPool),
            AmmError::Overflow => PipelineError::Internal(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_categories() {
        assert_eq!(Rejection::TransactionNotFound(H256::zero()).category(), "lookup");
        assert_eq!(
            Rejection::VictimSlippage { expected: U256::one(), minimum: U256::from(2) }.category(),
            "economic"
        );
        assert_eq!(Rejection::RouterRecipient.category(), "shape");
        assert_eq!(
            Rejection::SwapDecode(DecodeError::Misaligned(3)).category(),
            "decode"
        );
    }

    #[test]
    fn test_pipeline_error_from_rejection() {
        let err: PipelineError = Rejection::ZeroValue.into();
        assert!(matches!(err, PipelineError::NotAnOpportunity(Rejection::ZeroValue)));
    }

    #[test]
    fn test_amm_errors_split_between_rejection_and_internal() {
        let err: PipelineError = AmmError::InsufficientLiquidity.into();
        assert!(matches!(err, PipelineError::NotAnOpportunity(Rejection::EmptyPool)));
        assert_eq!(Rejection::EmptyPool.category(), "reserves");

        let err: PipelineError = AmmError::Overflow.into();
        assert!(matches!(err, PipelineError::Internal(_)));
    }
}
