pub mod amm;
pub mod traits;
pub mod uniswap_v2;
pub mod universal_router;

pub use amm::get_amount_out;
pub use traits::ReserveSource;
pub use uniswap_v2::{UniswapV2Client, V2Calldata};
pub use universal_router::{decode_v2_swap_input, RouterCall, UniversalRouterDecoder};
