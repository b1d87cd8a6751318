use anyhow::{Context, Result};
use async_trait::async_trait;
use ethers::prelude::*;
use ethers::types::{Address, U256};
use models::{FeeTier, QuoterVersion, Token};
use std::sync::Arc;
use tracing::debug;

use crate::common::QuoteOracle;

// Uniswap V3 Quoter ABI
abigen!(
    UniswapV3Quoter,
    r#"[
        function quoteExactInputSingle(address tokenIn, address tokenOut, uint24 fee, uint256 amountIn, uint160 sqrtPriceLimitX96) external returns (uint256 amountOut)
    ]"#
);

/// QuoterV2 参数为结构体，返回值多了价格和 gas 信息
pub mod v2 {
    use ethers::prelude::*;

    abigen!(
        UniswapV3QuoterV2,
        r#"[
            struct QuoteExactInputSingleParams { address tokenIn; address tokenOut; uint256 amountIn; uint24 fee; uint160 sqrtPriceLimitX96; }
            function quoteExactInputSingle(QuoteExactInputSingleParams memory params) external returns (uint256 amountOut, uint160 sqrtPriceX96After, uint32 initializedTicksCrossed, uint256 gasEstimate)
        ]"#
    );
}

/// 基于 Uniswap V3 Quoter 合约的报价实现
pub struct UniswapV3QuoteOracle<M: Middleware> {
    provider: Arc<M>,
    quoter_address: Address,
    version: QuoterVersion,
}

impl<M: Middleware + 'static> UniswapV3QuoteOracle<M> {
    pub fn new(provider: Arc<M>, quoter_address: Address, version: QuoterVersion) -> Self {
        Self {
            provider,
            quoter_address,
            version,
        }
    }

    pub fn quoter_address(&self) -> Address {
        self.quoter_address
    }

    pub fn version(&self) -> QuoterVersion {
        self.version
    }

    /// 调用 Quoter，错误原样返回
    pub async fn quote_exact_input_single(
        &self,
        token_in: Address,
        token_out: Address,
        fee: FeeTier,
        amount_in: U256,
    ) -> Result<U256> {
        // sqrtPriceLimitX96 = 0 表示无限制
        let amount_out = match self.version {
            QuoterVersion::V1 => {
                let quoter = UniswapV3Quoter::new(self.quoter_address, self.provider.clone());
                quoter
                    .quote_exact_input_single(token_in, token_out, fee.pips(), amount_in, U256::zero())
                    .call()
                    .await?
            }
            QuoterVersion::V2 => {
                let quoter = v2::UniswapV3QuoterV2::new(self.quoter_address, self.provider.clone());
                let params = v2::QuoteExactInputSingleParams {
                    token_in,
                    token_out,
                    amount_in,
                    fee: fee.pips(),
                    sqrt_price_limit_x96: U256::zero(),
                };
                let (amount_out, _, _, _) = quoter.quote_exact_input_single(params).call().await?;
                amount_out
            }
        };

        Ok(amount_out)
    }
}

#[async_trait]
impl<M: Middleware + 'static> QuoteOracle for UniswapV3QuoteOracle<M> {
    async fn quote(&self, token_in: &Token, token_out: &Token, fee: FeeTier, amount_in: U256) -> U256 {
        match self
            .quote_exact_input_single(token_in.address, token_out.address, fee, amount_in)
            .await
        {
            Ok(amount_out) => amount_out,
            Err(e) => {
                debug!(
                    target: "path_finder",
                    "Quoter 报价失败 {} -> {} fee={}: {}",
                    token_in.symbol,
                    token_out.symbol,
                    fee.pips(),
                    e
                );
                U256::zero()
            }
        }
    }

    async fn check_network(&self) -> Result<u64> {
        let chain_id = self
            .provider
            .get_chainid()
            .await
            .context("获取 chain id 失败")?;
        Ok(chain_id.as_u64())
    }
}
