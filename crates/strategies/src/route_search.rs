use async_trait::async_trait;
use dex::{QuoteOracle, SwapCall, SwapRouterEncoder};
use ethers::types::{Address, U256};
use models::{BestRoute, RoutingError, Token};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::PathFinder;

const BPS_DENOMINATOR: u32 = 10_000;

/// 单条路由的执行约束
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteOptions {
    pub recipient: Address,
    /// 50 = 0.50%
    pub slippage_bps: u32,
    /// unix 秒
    pub deadline: u64,
    /// 输入是原生币时，交易需附带 amount_in 作为 value
    pub native_input: bool,
}

/// 最优路由搜索
#[async_trait]
pub trait RouteSearch: Send + Sync {
    async fn best_route(
        &self,
        amount_in: U256,
        input: &Token,
        output: &Token,
        options: &RouteOptions,
    ) -> Result<BestRoute, RoutingError>;
}

#[async_trait]
impl<T: RouteSearch + ?Sized> RouteSearch for Arc<T> {
    async fn best_route(
        &self,
        amount_in: U256,
        input: &Token,
        output: &Token,
        options: &RouteOptions,
    ) -> Result<BestRoute, RoutingError> {
        (**self).best_route(amount_in, input, output, options).await
    }
}

/// quoted × (10000 − bps) / 10000，向下取整
pub fn apply_slippage(quoted: U256, slippage_bps: u32) -> U256 {
    let keep = U256::from(BPS_DENOMINATOR - slippage_bps.min(BPS_DENOMINATOR));
    let denominator = U256::from(BPS_DENOMINATOR);
    match quoted.checked_mul(keep) {
        Some(product) => product / denominator,
        None => quoted / denominator * keep,
    }
}

/// 基于本地 PathFinder 的路由搜索，取排序第一的路径
pub struct LocalRouteSearch {
    finder: PathFinder,
    oracle: Arc<dyn QuoteOracle>,
    base_tokens: Vec<Token>,
    encoder: SwapRouterEncoder,
    chain_id: u64,
}

impl LocalRouteSearch {
    pub fn new(
        oracle: Arc<dyn QuoteOracle>,
        base_tokens: Vec<Token>,
        encoder: SwapRouterEncoder,
        chain_id: u64,
    ) -> Self {
        Self {
            finder: PathFinder::new(oracle.clone()),
            oracle,
            base_tokens,
            encoder,
            chain_id,
        }
    }

    pub fn finder(&self) -> &PathFinder {
        &self.finder
    }

    pub fn base_tokens(&self) -> &[Token] {
        &self.base_tokens
    }

    /// 确认节点所在链与配置一致
    async fn verify_network(&self) -> Result<(), RoutingError> {
        let chain_id = self
            .oracle
            .check_network()
            .await
            .map_err(|e| RoutingError::Oracle(format!("network check failed: {:#}", e)))?;

        if chain_id != self.chain_id {
            warn!(target: "split_router", "节点链 ID 不一致: 期望 {}, 实际 {}", self.chain_id, chain_id);
            return Err(RoutingError::Oracle(format!(
                "connected to chain {} but configured for chain {}",
                chain_id, self.chain_id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RouteSearch for LocalRouteSearch {
    async fn best_route(
        &self,
        amount_in: U256,
        input: &Token,
        output: &Token,
        options: &RouteOptions,
    ) -> Result<BestRoute, RoutingError> {
        self.verify_network().await?;

        let paths = self
            .finder
            .find_best_paths(amount_in, input, &self.base_tokens, std::slice::from_ref(output))
            .await;

        let best = paths
            .into_iter()
            .next()
            .ok_or_else(|| RoutingError::NoRoute(format!("{} -> {}", input.symbol, output.symbol)))?;

        let amount_out_minimum = apply_slippage(best.output_amount, options.slippage_bps);
        let calldata = self.encoder.encode_swap(&SwapCall {
            path: &best,
            recipient: options.recipient,
            amount_in,
            amount_out_minimum,
            deadline: options.deadline,
        })?;

        debug!(
            target: "split_router",
            "最优路径 {} (min out {})",
            best,
            amount_out_minimum
        );

        Ok(BestRoute {
            path: best,
            amount_in,
            amount_out_minimum,
            deadline: options.deadline,
            calldata,
            value: if options.native_input { amount_in } else { U256::zero() },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use models::{FeeTier, RouterVersion};

    fn options(native_input: bool) -> RouteOptions {
        RouteOptions {
            recipient: Address::repeat_byte(0xaa),
            slippage_bps: 50,
            deadline: 1_700_000_000,
            native_input,
        }
    }

    fn search(oracle: Arc<ScriptedOracle>) -> LocalRouteSearch {
        LocalRouteSearch::new(oracle, vec![weth()], SwapRouterEncoder::new(RouterVersion::V2), CHAIN_ID)
    }

    #[test]
    fn test_apply_slippage() {
        assert_eq!(apply_slippage(U256::from(3_000_000_000u64), 50), U256::from(2_985_000_000u64));
        assert_eq!(apply_slippage(U256::from(999u64), 0), U256::from(999u64));
        assert_eq!(apply_slippage(U256::from(999u64), 10_000), U256::zero());
        assert_eq!(apply_slippage(U256::from(199u64), 50), U256::from(198u64));
        assert_eq!(apply_slippage(U256::MAX, 0), U256::MAX / U256::from(10_000u64) * U256::from(10_000u64));
    }

    #[tokio::test]
    async fn test_best_route_takes_top_path() {
        let oracle = Arc::new(
            ScriptedOracle::new()
                .with_quote(&weth(), &usdc(), FeeTier::Low, 3_000_000_000)
                .with_quote(&weth(), &usdc(), FeeTier::Medium, 2_900_000_000),
        );
        let route = search(oracle.clone())
            .best_route(U256::exp10(18), &weth(), &usdc(), &options(true))
            .await
            .unwrap();

        assert_eq!(oracle.network_checks(), 1);
        assert_eq!(route.path.fee1, FeeTier::Low);
        assert_eq!(route.amount_out_minimum, U256::from(2_985_000_000u64));
        assert_eq!(route.value, U256::exp10(18));
        assert_eq!(route.deadline, 1_700_000_000);
        // SwapRouter02 exactInputSingle
        assert_eq!(&route.calldata[..4], &[0x04, 0xe4, 0x5a, 0xaf]);
    }

    #[tokio::test]
    async fn test_token_input_commits_no_value() {
        let oracle = Arc::new(ScriptedOracle::new().with_quote(&usdc(), &dai(), FeeTier::Lowest, 999));
        let route = search(oracle)
            .best_route(U256::from(1_000u64), &usdc(), &dai(), &options(false))
            .await
            .unwrap();
        assert!(route.value.is_zero());
    }

    #[tokio::test]
    async fn test_all_zero_quotes_is_no_route() {
        let oracle = Arc::new(ScriptedOracle::new());
        let err = search(oracle)
            .best_route(U256::exp10(18), &weth(), &cbbtc(), &options(true))
            .await
            .unwrap_err();
        assert_eq!(err, RoutingError::NoRoute("WETH -> cbBTC".to_string()));
    }

    #[tokio::test]
    async fn test_network_problems_are_oracle_errors() {
        let unreachable = Arc::new(ScriptedOracle::new().on_chain(None));
        let err = search(unreachable.clone())
            .best_route(U256::exp10(18), &weth(), &usdc(), &options(true))
            .await
            .unwrap_err();
        assert!(err.is_transient());
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(unreachable.calls(), 0);

        let wrong_chain = Arc::new(ScriptedOracle::new().on_chain(Some(1)));
        let err = search(wrong_chain)
            .best_route(U256::exp10(18), &weth(), &usdc(), &options(true))
            .await
            .unwrap_err();
        assert!(matches!(err, RoutingError::Oracle(_)));
    }
}
