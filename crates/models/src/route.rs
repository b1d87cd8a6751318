use ethers::types::{Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::amount::u256_dec;
use crate::SwapPath;

/// 单次最优路由搜索结果 (可直接执行的一条腿)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestRoute {
    pub path: SwapPath,
    #[serde(with = "u256_dec")]
    pub amount_in: U256,
    /// 扣除滑点后的最少输出
    #[serde(with = "u256_dec")]
    pub amount_out_minimum: U256,
    /// 截止时间 (unix 秒)，由执行场所校验
    pub deadline: u64,
    pub calldata: Bytes,
    /// 需要随交易附带的原生币数量
    #[serde(with = "u256_dec")]
    pub value: U256,
}

/// 单个拆分项的路由结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResult {
    pub input_token: String,
    pub output_token: String,
    pub percentage: f64,
    #[serde(with = "u256_dec")]
    pub amount_in: U256,
    /// 6 位有效数字的报价，仅用于展示
    pub quote: String,
    #[serde(with = "u256_dec")]
    pub quote_raw: U256,
    pub route: SwapPath,
    pub calldata: Bytes,
    #[serde(with = "u256_dec")]
    pub value: U256,
}

/// 多路拆分的汇总结果，交给执行方提交
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiRouteResult {
    pub routes: Vec<RouteResult>,
    #[serde(with = "u256_dec")]
    pub total_input_value: U256,
    /// 与拆分请求顺序一致
    pub calldata: Vec<Bytes>,
    pub deadline: u64,
}

impl MultiRouteResult {
    pub fn new(routes: Vec<RouteResult>, deadline: u64) -> Self {
        let total_input_value = routes
            .iter()
            .fold(U256::zero(), |acc, route| acc.saturating_add(route.value));
        let calldata = routes.iter().map(|route| route.calldata.clone()).collect();

        Self {
            routes,
            total_input_value,
            calldata,
            deadline,
        }
    }
}
