use dex::QuoteOracle;
use ethers::types::Address;
use futures_util::future::join_all;
use models::amount::{is_zero_decimal, parse_units};
use models::{MultiRouteResult, RoutingError, SwapPath, Token};
use serde::{Deserialize, Serialize};
use services::TokenResolver;
use std::sync::Arc;
use tracing::info;

use crate::{PathFinder, RouteSearch, SplitOutcome, SplitRouteRequest, SplitRouter, SplitRouterSettings};

/// 路径查询请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindPathsRequest {
    pub input_token: String,
    pub input_amount: String,
    pub output_tokens: Vec<String>,
    /// 不传则用配置的 base token
    #[serde(default)]
    pub base_tokens: Option<Vec<String>>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// 按 symbol 批量解析，任一失败即返回 Resolution 错误
pub async fn resolve_symbols(
    resolver: &dyn TokenResolver,
    symbols: &[String],
) -> Result<Vec<Token>, RoutingError> {
    let lookups = symbols.iter().map(|symbol| async move {
        match resolver.resolve(symbol.trim()).await {
            Ok(Some(token)) => Ok(token),
            Ok(None) => Err(RoutingError::Resolution(format!(
                "Token {} not found or not supported",
                symbol
            ))),
            Err(e) => Err(RoutingError::Resolution(format!(
                "Token {} lookup failed: {:#}",
                symbol, e
            ))),
        }
    });
    join_all(lookups).await.into_iter().collect()
}

/// 一个进程内共享的路由会话
///
/// 在启动时构造一次，之后每个请求都复用同一份 oracle / resolver / 默认参数
pub struct RouterSession {
    resolver: Arc<dyn TokenResolver>,
    finder: PathFinder,
    base_tokens: Vec<Token>,
    router: SplitRouter,
    default_recipient: Option<Address>,
}

impl RouterSession {
    pub fn new(
        resolver: Arc<dyn TokenResolver>,
        oracle: Arc<dyn QuoteOracle>,
        search: Arc<dyn RouteSearch>,
        base_tokens: Vec<Token>,
        settings: SplitRouterSettings,
        default_recipient: Option<Address>,
    ) -> Self {
        Self {
            router: SplitRouter::new(resolver.clone(), search, settings),
            resolver,
            finder: PathFinder::new(oracle),
            base_tokens,
            default_recipient,
        }
    }

    pub fn base_tokens(&self) -> &[Token] {
        &self.base_tokens
    }

    pub fn default_recipient(&self) -> Option<Address> {
        self.default_recipient
    }

    fn recipient(&self, recipient: Option<Address>) -> Result<Address, RoutingError> {
        recipient
            .or(self.default_recipient)
            .ok_or_else(|| RoutingError::Validation("recipient address is required".to_string()))
    }

    /// 拆分路由 (任一失败则整体失败)
    pub async fn split_routes(
        &self,
        recipient: Option<Address>,
        request: &SplitRouteRequest,
    ) -> Result<MultiRouteResult, RoutingError> {
        let wallet = self.recipient(recipient)?;
        self.router.get_routes(wallet, request).await
    }

    /// 拆分路由，保留成功的腿
    pub async fn split_outcome(
        &self,
        recipient: Option<Address>,
        request: &SplitRouteRequest,
    ) -> Result<SplitOutcome, RoutingError> {
        let wallet = self.recipient(recipient)?;
        self.router.route_splits(wallet, request).await
    }

    /// 列出 input -> outputs 的候选路径
    pub async fn find_paths(&self, request: &FindPathsRequest) -> Result<Vec<SwapPath>, RoutingError> {
        if request.input_token.trim().is_empty() {
            return Err(RoutingError::Validation("input token is required".to_string()));
        }
        if is_zero_decimal(&request.input_amount)? {
            return Err(RoutingError::Validation("input amount must be positive".to_string()));
        }
        if request.output_tokens.is_empty() {
            return Err(RoutingError::Validation("at least one output token is required".to_string()));
        }
        if request.limit == Some(0) {
            return Err(RoutingError::Validation("limit must be positive".to_string()));
        }

        let input = resolve_symbols(self.resolver.as_ref(), std::slice::from_ref(&request.input_token))
            .await?
            .remove(0);
        let amount = parse_units(&request.input_amount, input.decimals)?;

        let outputs = resolve_symbols(self.resolver.as_ref(), &request.output_tokens).await?;
        let bases = match &request.base_tokens {
            Some(symbols) => resolve_symbols(self.resolver.as_ref(), symbols).await?,
            None => self.base_tokens.clone(),
        };

        let mut paths = self.finder.find_best_paths(amount, &input, &bases, &outputs).await;
        if paths.is_empty() {
            let targets: Vec<&str> = outputs.iter().map(|t| t.symbol.as_str()).collect();
            return Err(RoutingError::NoRoute(format!(
                "{} -> {}",
                input.symbol,
                targets.join(", ")
            )));
        }
        if let Some(limit) = request.limit {
            paths.truncate(limit);
        }

        info!(target: "path_finder", "返回 {} 条路径: {}", paths.len(), paths[0]);
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use crate::LocalRouteSearch;
    use dex::SwapRouterEncoder;
    use ethers::types::U256;
    use models::{FeeTier, RouterVersion, SplitRequest};

    fn session(oracle: Arc<ScriptedOracle>, recipient: Option<Address>) -> RouterSession {
        let resolver: Arc<dyn TokenResolver> =
            Arc::new(CountingResolver::new(vec![weth(), usdc(), dai(), cbbtc()]));
        let search = Arc::new(LocalRouteSearch::new(
            oracle.clone(),
            vec![weth()],
            SwapRouterEncoder::new(RouterVersion::V2),
            CHAIN_ID,
        ));
        RouterSession::new(
            resolver,
            oracle,
            search,
            vec![weth()],
            SplitRouterSettings::default(),
            recipient,
        )
    }

    fn paths_request(input: &str, outputs: &[&str]) -> FindPathsRequest {
        FindPathsRequest {
            input_token: input.to_string(),
            input_amount: "1".to_string(),
            output_tokens: outputs.iter().map(|s| s.to_string()).collect(),
            base_tokens: None,
            limit: None,
        }
    }

    #[tokio::test]
    async fn test_find_paths_sorted_and_limited() {
        let oracle = Arc::new(
            ScriptedOracle::new()
                .with_quote(&weth(), &usdc(), FeeTier::Lowest, 2_999)
                .with_quote(&weth(), &usdc(), FeeTier::Low, 3_001)
                .with_quote(&weth(), &usdc(), FeeTier::Medium, 3_000)
                .with_quote(&weth(), &usdc(), FeeTier::High, 2_900),
        );
        let session = session(oracle.clone(), None);

        let all = session.find_paths(&paths_request("WETH", &["USDC"])).await.unwrap();
        assert_eq!(all.len(), 4);
        assert!(all.windows(2).all(|w| w[0].output_amount >= w[1].output_amount));
        assert_eq!(all[0].output_amount, U256::from(3_001u64));

        let mut limited = paths_request("ETH", &["USDC"]);
        limited.limit = Some(2);
        let top = session.find_paths(&limited).await.unwrap();
        assert_eq!(top, all[..2].to_vec());
    }

    #[tokio::test]
    async fn test_find_paths_without_liquidity_is_no_route() {
        let session = session(Arc::new(ScriptedOracle::new()), None);
        let err = session
            .find_paths(&paths_request("WETH", &["cbBTC"]))
            .await
            .unwrap_err();
        assert_eq!(err, RoutingError::NoRoute("WETH -> cbBTC".to_string()));
    }

    #[tokio::test]
    async fn test_find_paths_unknown_output() {
        let session = session(Arc::new(ScriptedOracle::new()), None);
        let err = session
            .find_paths(&paths_request("WETH", &["USDC", "NOPE"]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "resolution");
        assert!(err.to_string().contains("NOPE"));
    }

    #[tokio::test]
    async fn test_find_paths_zero_amount_skips_resolver() {
        let oracle = Arc::new(ScriptedOracle::new());
        let resolver = Arc::new(CountingResolver::new(vec![weth(), usdc()]));
        let session = RouterSession::new(
            resolver.clone(),
            oracle.clone(),
            Arc::new(LocalRouteSearch::new(
                oracle.clone(),
                vec![weth()],
                SwapRouterEncoder::new(RouterVersion::V2),
                CHAIN_ID,
            )),
            vec![weth()],
            SplitRouterSettings::default(),
            None,
        );

        let mut request = paths_request("WETH", &["USDC"]);
        request.input_amount = "0.000".to_string();
        let err = session.find_paths(&request).await.unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert_eq!(resolver.calls(), 0);
        assert_eq!(oracle.calls(), 0);
    }

    #[tokio::test]
    async fn test_split_routes_needs_recipient() {
        let oracle = Arc::new(ScriptedOracle::new().with_quote(&weth(), &usdc(), FeeTier::Low, 3_000));
        let request = SplitRouteRequest {
            input_token: "WETH".into(),
            input_amount: "1".into(),
            splits: vec![SplitRequest::new("USDC", 100.0)],
            slippage_bps: None,
            deadline_secs: None,
        };

        let err = session(oracle.clone(), None)
            .split_routes(None, &request)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation");

        let with_default = session(oracle, Some(Address::repeat_byte(0xbb)));
        let result = with_default.split_routes(None, &request).await.unwrap();
        assert_eq!(result.routes.len(), 1);

        let outcome = with_default.split_outcome(None, &request).await.unwrap();
        assert!(outcome.failures.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_symbols_keeps_order() {
        let resolver = CountingResolver::new(vec![weth(), usdc(), dai()]);
        let symbols = vec!["dai".to_string(), "ETH".to_string(), "USDC".to_string()];
        let tokens = resolve_symbols(&resolver, &symbols).await.unwrap();
        assert_eq!(tokens, vec![dai(), weth(), usdc()]);
    }
}
