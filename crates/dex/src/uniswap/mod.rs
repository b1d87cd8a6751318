pub mod quoter;
pub mod router;

pub use quoter::UniswapV3QuoteOracle;
pub use router::{encode_path, SwapCall, SwapRouterEncoder};
