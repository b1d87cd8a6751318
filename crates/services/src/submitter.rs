use anyhow::{Context, Result};
use async_trait::async_trait;
use dex::SwapRouterEncoder;
use ethers::prelude::*;
use ethers::types::{Address, Bytes, TransactionRequest, U256};
use models::amount::u256_dec;
use models::{MultiRouteResult, RoutingError};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// 提交给钱包的交易内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPayload {
    /// SwapRouter 合约
    pub to: Address,
    #[serde(with = "u256_dec")]
    pub value: U256,
    /// multicall 打包后的调用数据
    pub data: Bytes,
}

impl ExecutionPayload {
    /// 按拆分顺序把每条腿的 calldata 打包进一次 multicall
    pub fn from_result(
        result: &MultiRouteResult,
        router: Address,
        encoder: &SwapRouterEncoder,
    ) -> Result<Self, RoutingError> {
        let data = encoder.encode_multicall(&result.calldata, result.deadline)?;
        Ok(Self {
            to: router,
            value: result.total_input_value,
            data,
        })
    }
}

/// 交易提交接口，返回值是不透明的提交标识
#[async_trait]
pub trait ExecutionSubmitter: Send + Sync {
    async fn submit(&self, payload: &ExecutionPayload) -> Result<String>;
}

/// 通过 Middleware (一般是 SignerMiddleware) 发送交易
pub struct MiddlewareSubmitter<M: Middleware> {
    client: Arc<M>,
    /// 未设置时由 Middleware 估算
    gas_limit: Option<U256>,
    gas_price: Option<U256>,
}

impl<M: Middleware + 'static> MiddlewareSubmitter<M> {
    pub fn new(client: Arc<M>) -> Self {
        Self {
            client,
            gas_limit: None,
            gas_price: None,
        }
    }

    pub fn with_gas_limit(mut self, gas_limit: U256) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    pub fn with_gas_price(mut self, gas_price: U256) -> Self {
        self.gas_price = Some(gas_price);
        self
    }

    fn build_transaction(&self, payload: &ExecutionPayload) -> TransactionRequest {
        let mut tx = TransactionRequest::new()
            .to(payload.to)
            .value(payload.value)
            .data(payload.data.clone());
        if let Some(gas) = self.gas_limit {
            tx = tx.gas(gas);
        }
        if let Some(gas_price) = self.gas_price {
            tx = tx.gas_price(gas_price);
        }
        tx
    }
}

#[async_trait]
impl<M: Middleware + 'static> ExecutionSubmitter for MiddlewareSubmitter<M> {
    async fn submit(&self, payload: &ExecutionPayload) -> Result<String> {
        let tx = self.build_transaction(payload);

        let pending = self
            .client
            .send_transaction(tx, None)
            .await
            .context("发送交易失败")?;
        let tx_hash = pending.tx_hash();

        info!("交易已发送: {:?}, value={}", tx_hash, payload.value);
        Ok(format!("{:?}", tx_hash))
    }
}
