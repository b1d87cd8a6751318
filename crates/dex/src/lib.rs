pub mod uniswap;
pub mod common;

pub use common::QuoteOracle;
pub use uniswap::{encode_path, SwapCall, SwapRouterEncoder, UniswapV3QuoteOracle};
