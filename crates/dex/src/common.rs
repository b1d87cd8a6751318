use anyhow::Result;
use async_trait::async_trait;
use ethers::types::U256;
use models::{FeeTier, Token};
use std::sync::Arc;

/// 单池报价接口
#[async_trait]
pub trait QuoteOracle: Send + Sync {
    /// 单池精确输入报价
    ///
    /// 池子不存在、流动性不足或调用失败时返回 0，不返回错误
    async fn quote(&self, token_in: &Token, token_out: &Token, fee: FeeTier, amount_in: U256) -> U256;

    /// 返回节点所在链的 chain id
    async fn check_network(&self) -> Result<u64>;
}

#[async_trait]
impl<T: QuoteOracle + ?Sized> QuoteOracle for Arc<T> {
    async fn quote(&self, token_in: &Token, token_out: &Token, fee: FeeTier, amount_in: U256) -> U256 {
        (**self).quote(token_in, token_out, fee, amount_in).await
    }

    async fn check_network(&self) -> Result<u64> {
        (**self).check_network().await
    }
}
