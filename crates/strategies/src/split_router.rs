use ethers::types::{Address, U256};
use futures_util::future::join_all;
use models::amount::{is_zero_decimal, parse_units, to_significant};
use models::{
    portion_amount, validate_percentages, MultiRouteResult, RouteResult, RoutingError, SplitFailure,
    SplitRequest, Token,
};
use serde::{Deserialize, Serialize};
use services::TokenResolver;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use utils::{deadline_after, with_retry_if, RetryPolicy};

use crate::{RouteOptions, RouteSearch};

/// 报价展示的有效数字位数
const QUOTE_SIGNIFICANT_DIGITS: usize = 6;

/// 拆分路由请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitRouteRequest {
    pub input_token: String,
    /// 十进制数量，如 "1.5"
    pub input_amount: String,
    pub splits: Vec<SplitRequest>,
    #[serde(default)]
    pub slippage_bps: Option<u32>,
    #[serde(default)]
    pub deadline_secs: Option<u64>,
}

/// 拆分路由默认参数
#[derive(Debug, Clone)]
pub struct SplitRouterSettings {
    pub slippage_bps: u32,
    pub deadline_secs: u64,
    pub retry: RetryPolicy,
    /// 链原生币 symbol，输入为它时每条腿附带 value
    pub native_symbol: String,
}

impl Default for SplitRouterSettings {
    fn default() -> Self {
        Self {
            slippage_bps: 50,
            deadline_secs: 1200,
            retry: RetryPolicy::new(3, Duration::from_secs(1)),
            native_symbol: "ETH".to_string(),
        }
    }
}

/// 每个拆分项各自的结果，成功和失败互不影响
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitOutcome {
    pub routes: Vec<RouteResult>,
    pub failures: Vec<SplitFailure>,
    pub deadline: u64,
}

impl SplitOutcome {
    /// 任一拆分失败则整体失败
    pub fn into_result(self) -> Result<MultiRouteResult, RoutingError> {
        if self.failures.is_empty() {
            Ok(MultiRouteResult::new(self.routes, self.deadline))
        } else {
            Err(RoutingError::AggregateSplit(self.failures))
        }
    }
}

struct ResolvedRequest {
    input: Token,
    amount: U256,
    options: RouteOptions,
}

/// 拆分路由器
pub struct SplitRouter {
    resolver: Arc<dyn TokenResolver>,
    search: Arc<dyn RouteSearch>,
    settings: SplitRouterSettings,
}

impl SplitRouter {
    pub fn new(
        resolver: Arc<dyn TokenResolver>,
        search: Arc<dyn RouteSearch>,
        settings: SplitRouterSettings,
    ) -> Self {
        Self {
            resolver,
            search,
            settings,
        }
    }

    pub fn settings(&self) -> &SplitRouterSettings {
        &self.settings
    }

    /// 计算所有拆分的路由，任一失败则返回 AggregateSplit
    pub async fn get_routes(
        &self,
        wallet: Address,
        request: &SplitRouteRequest,
    ) -> Result<MultiRouteResult, RoutingError> {
        let outcome = self.route_splits(wallet, request).await?;
        let total = request.splits.len();

        match outcome.into_result() {
            Ok(result) => {
                info!(
                    target: "split_router",
                    "拆分路由完成: {} 条, 总 value {}",
                    result.routes.len(),
                    result.total_input_value
                );
                Ok(result)
            }
            Err(err) => {
                if let RoutingError::AggregateSplit(failures) = &err {
                    warn!(target: "split_router", "{}/{} 个拆分失败: {}", failures.len(), total, err);
                }
                Err(err)
            }
        }
    }

    /// 计算所有拆分的路由，分别返回成功和失败
    ///
    /// 请求本身无效 (比例、数量、输入代币) 时直接返回错误
    pub async fn route_splits(
        &self,
        wallet: Address,
        request: &SplitRouteRequest,
    ) -> Result<SplitOutcome, RoutingError> {
        if let Err(e) = self.validate(request) {
            warn!(target: "split_router", "请求校验失败: {}", e);
            return Err(e);
        }

        let resolved = self.resolve_request(wallet, request).await?;

        let legs = request
            .splits
            .iter()
            .enumerate()
            .map(|(index, split)| self.route_split(index, split, &resolved));
        let results = join_all(legs).await;

        let mut routes = Vec::new();
        let mut failures = Vec::new();
        for (index, (split, result)) in request.splits.iter().zip(results).enumerate() {
            match result {
                Ok(route) => routes.push(route),
                Err(cause) => {
                    warn!(target: "split_router", "拆分 #{} {} 失败: {}", index, split.token, cause);
                    failures.push(SplitFailure {
                        index,
                        token: split.token.clone(),
                        percentage: split.percentage,
                        cause,
                    });
                }
            }
        }

        Ok(SplitOutcome {
            routes,
            failures,
            deadline: resolved.options.deadline,
        })
    }

    /// 纯本地校验，不触发任何外部调用
    fn validate(&self, request: &SplitRouteRequest) -> Result<(), RoutingError> {
        if request.input_token.trim().is_empty() {
            return Err(RoutingError::Validation("input token is required".to_string()));
        }
        if is_zero_decimal(&request.input_amount)? {
            return Err(RoutingError::Validation("input amount must be positive".to_string()));
        }
        if let Some(index) = request.splits.iter().position(|s| s.token.trim().is_empty()) {
            return Err(RoutingError::Validation(format!("split #{} token is required", index)));
        }
        validate_percentages(request.splits.iter().map(|s| s.percentage))?;
        if let Some(bps) = request.slippage_bps {
            if bps > 10_000 {
                return Err(RoutingError::Validation(format!(
                    "slippage must be <= 10000 bps, got {}",
                    bps
                )));
            }
        }
        Ok(())
    }

    async fn resolve_request(
        &self,
        wallet: Address,
        request: &SplitRouteRequest,
    ) -> Result<ResolvedRequest, RoutingError> {
        let symbol = request.input_token.trim();
        let input = self.resolve_token(symbol, "Input").await?;

        let amount = parse_units(&request.input_amount, input.decimals)?;

        let options = RouteOptions {
            recipient: wallet,
            slippage_bps: request.slippage_bps.unwrap_or(self.settings.slippage_bps),
            deadline: deadline_after(request.deadline_secs.unwrap_or(self.settings.deadline_secs)),
            native_input: symbol.eq_ignore_ascii_case(&self.settings.native_symbol),
        };

        Ok(ResolvedRequest { input, amount, options })
    }

    async fn resolve_token(&self, symbol: &str, role: &str) -> Result<Token, RoutingError> {
        match self.resolver.resolve(symbol).await {
            Ok(Some(token)) => Ok(token),
            Ok(None) => Err(RoutingError::Resolution(format!(
                "{} token {} not found or not supported",
                role, symbol
            ))),
            Err(e) => Err(RoutingError::Resolution(format!(
                "{} token {} lookup failed: {:#}",
                role, symbol, e
            ))),
        }
    }

    async fn route_split(
        &self,
        index: usize,
        split: &SplitRequest,
        resolved: &ResolvedRequest,
    ) -> Result<RouteResult, RoutingError> {
        let output = self.resolve_token(split.token.trim(), "Output").await?;

        let portion = portion_amount(resolved.amount, split.percentage)?;
        if portion.is_zero() {
            return Err(RoutingError::Validation(format!(
                "{}% of {} {} rounds to zero",
                split.percentage, resolved.amount, resolved.input.symbol
            )));
        }

        let label = format!("split #{} {} -> {}", index, resolved.input.symbol, output.symbol);
        let route = with_retry_if(&label, self.settings.retry, RoutingError::is_transient, || {
            self.search
                .best_route(portion, &resolved.input, &output, &resolved.options)
        })
        .await?;

        Ok(RouteResult {
            input_token: resolved.input.symbol.clone(),
            output_token: output.symbol.clone(),
            percentage: split.percentage,
            amount_in: portion,
            quote: to_significant(route.path.output_amount, output.decimals, QUOTE_SIGNIFICANT_DIGITS),
            quote_raw: route.path.output_amount,
            route: route.path,
            calldata: route.calldata,
            value: route.value,
        })
    }
}
