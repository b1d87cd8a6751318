//! 应用启动引导模块
//!
//! 封装配置加载、链上依赖构建和路由会话的装配

use anyhow::{anyhow, Context, Result};
use config_crate::AppConfig;
use dex::{QuoteOracle, SwapRouterEncoder, UniswapV3QuoteOracle};
use ethers::prelude::*;
use ethers::signers::LocalWallet;
use models::MultiRouteResult;
use services::{
    ExecutionPayload, ExecutionSubmitter, FallbackTokenResolver, MiddlewareSubmitter,
    StaticTokenResolver, SubgraphTokenResolver, TokenResolver,
};
use std::sync::Arc;
use std::time::Duration;
use strategies::{resolve_symbols, LocalRouteSearch, RouterSession, SplitRouterSettings};
use tracing::{error, info, warn};
use ::utils::RetryPolicy;

/// 应用程序实例
///
/// 启动时构造一次，HTTP 服务和 CLI 子命令共用同一个会话
pub struct Application {
    config: AppConfig,
    provider: Arc<Provider<Http>>,
    session: Arc<RouterSession>,
    router_address: Address,
}

impl Application {
    /// 初始化应用
    pub async fn start(config: AppConfig) -> Result<Self> {
        Self::log_config(&config);

        let chain = &config.chain;
        let provider = Provider::<Http>::try_from(chain.rpc_url.as_str())
            .with_context(|| format!("Invalid RPC_URL {}", chain.rpc_url))?;
        let provider = Arc::new(provider);

        let quoter_address = parse_address("quoter", &chain.contracts.quoter)?;
        let router_address = parse_address("swap router", &chain.contracts.swap_router)?;

        let oracle: Arc<dyn QuoteOracle> = Arc::new(UniswapV3QuoteOracle::new(
            provider.clone(),
            quoter_address,
            chain.contracts.quoter_version,
        ));

        let resolver = Self::init_resolver(&config)?;

        info!("解析 base token: {:?}", config.routing.base_tokens);
        let base_tokens = resolve_symbols(resolver.as_ref(), &config.routing.base_tokens)
            .await
            .context("Failed to resolve BASE_TOKENS")?;

        let search = Arc::new(LocalRouteSearch::new(
            oracle.clone(),
            base_tokens.clone(),
            SwapRouterEncoder::new(chain.contracts.router_version),
            chain.chain_id,
        ));

        let settings = SplitRouterSettings {
            slippage_bps: config.routing.slippage_bps,
            deadline_secs: config.routing.deadline_secs,
            retry: RetryPolicy::new(
                config.routing.retries,
                Duration::from_millis(config.routing.retry_delay_ms),
            ),
            native_symbol: chain.native_token.clone(),
        };

        let default_recipient = match config.wallet.address.as_deref() {
            Some(raw) => Some(parse_address("wallet", raw)?),
            None => {
                warn!("⚠️  WALLET_ADDRESS 未配置 - 每个拆分请求都必须带 recipient");
                None
            }
        };

        let session = RouterSession::new(
            resolver,
            oracle,
            search,
            base_tokens,
            settings,
            default_recipient,
        );

        info!("✅ 路由会话初始化完成");

        Ok(Self {
            config,
            provider,
            session: Arc::new(session),
            router_address,
        })
    }

    pub fn session(&self) -> &RouterSession {
        &self.session
    }

    /// 运行 API 服务器 (阻塞直到收到退出信号)
    pub async fn run_server(&self) -> Result<()> {
        let state = api::AppState::new(self.session.clone());
        let app = api::create_server(state).await;
        api::start_server(app, &self.config.api.host, self.config.api.port).await
    }

    /// 把拆分结果打包成一笔 multicall 并签名发送
    pub async fn submit(&self, result: &MultiRouteResult) -> Result<String> {
        let wallet = Self::init_wallet(&self.config)?;
        let encoder = SwapRouterEncoder::new(self.config.chain.contracts.router_version);
        let payload = ExecutionPayload::from_result(result, self.router_address, &encoder)?;

        info!(
            "提交交易: to={:?} value={} calldata={} bytes",
            payload.to,
            payload.value,
            payload.data.len()
        );

        let client = SignerMiddleware::new(self.provider.as_ref().clone(), wallet);
        let submitter = MiddlewareSubmitter::new(Arc::new(client));
        let tx_hash = submitter.submit(&payload).await?;

        info!("✅ 交易已发送: {}", tx_hash);
        Ok(tx_hash)
    }

    // ========== 私有辅助方法 ==========

    fn log_config(config: &AppConfig) {
        let chain = &config.chain;
        info!("配置加载成功");
        info!("========================================");
        info!("  [{}] chain_id={}", chain.name, chain.chain_id);
        info!("    RPC: {}", chain.rpc_url);
        info!(
            "    Quoter: {} ({:?})",
            chain.contracts.quoter, chain.contracts.quoter_version
        );
        info!(
            "    Router: {} ({:?})",
            chain.contracts.swap_router, chain.contracts.router_version
        );
        info!("========================================");
        info!("Base tokens: {}", config.routing.base_tokens.join(", "));
        info!("默认滑点: {} bps", config.routing.slippage_bps);
        info!("截止时间: {} 秒", config.routing.deadline_secs);
        info!(
            "重试: {} 次, 间隔 {} ms",
            config.routing.retries, config.routing.retry_delay_ms
        );
    }

    /// 内置 token 表优先，配置了 subgraph 再查 subgraph
    fn init_resolver(config: &AppConfig) -> Result<Arc<dyn TokenResolver>> {
        let chain = &config.chain;
        let aliases = config.resolver.aliases.clone();

        let local = StaticTokenResolver::from_entries(
            chain.chain_id,
            &chain.contracts.tokens,
            aliases.clone(),
        )?;
        info!("内置 token 表: {} 个", local.len());

        let mut resolvers: Vec<Arc<dyn TokenResolver>> = vec![Arc::new(local)];
        match &config.resolver.subgraph_url {
            Some(url) => {
                info!("✅ Subgraph 解析已启用: {}", url);
                resolvers.push(Arc::new(SubgraphTokenResolver::new(
                    url.clone(),
                    chain.chain_id,
                    aliases,
                )));
            }
            None => warn!("⚠️  SUBGRAPH_URL 未配置 - 只能解析内置 token"),
        }

        Ok(Arc::new(FallbackTokenResolver::new(resolvers)))
    }

    fn init_wallet(config: &AppConfig) -> Result<LocalWallet> {
        let private_key = config
            .wallet
            .private_key
            .as_deref()
            .ok_or_else(|| anyhow!("PRIVATE_KEY not set, cannot submit transactions"))?;
        let wallet = private_key
            .parse::<LocalWallet>()
            .map_err(|e| anyhow!("Invalid PRIVATE_KEY: {}", e))?
            .with_chain_id(config.chain.chain_id);
        info!("✅ 钱包私钥已配置: {:?}", wallet.address());
        Ok(wallet)
    }
}

fn parse_address(label: &str, raw: &str) -> Result<Address> {
    raw.trim()
        .parse::<Address>()
        .map_err(|e| anyhow!("Invalid {} address {}: {}", label, raw, e))
}

/// 设置全局 panic hook
pub fn setup_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("========================================");
        error!("!!! 系统发生 PANIC !!!");
        error!("========================================");
        error!("Panic 信息: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            error!(
                "发生位置: {}:{}:{}",
                location.file(),
                location.line(),
                location.column()
            );
        }
        if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            error!("Panic 消息: {}", s);
        }
        error!("========================================");
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        let address = parse_address("router", " 0x2626664c2603336E57B271c5C0b26F421741e481 ").unwrap();
        assert_eq!(
            format!("{:?}", address),
            "0x2626664c2603336e57b271c5c0b26f421741e481"
        );

        let err = parse_address("router", "0x1234").unwrap_err();
        assert!(err.to_string().contains("Invalid router address 0x1234"));
    }

    #[tokio::test]
    async fn test_start_fails_on_unknown_base_token() {
        let mut config = AppConfig::from_source(|_| None).unwrap();
        config.routing.base_tokens = vec!["NOPE".to_string()];

        let err = Application::start(config).await.err().unwrap();
        assert!(format!("{:#}", err).contains("NOPE"));
    }
}
