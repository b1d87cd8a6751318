use anyhow::{anyhow, Context, Result};
use models::{QuoterVersion, RouterVersion};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub chain: ChainConfig,
    pub routing: RoutingConfig,
    pub resolver: ResolverConfig,
    pub wallet: WalletConfig,
    pub api: ApiConfig,
    pub log: LogConfig,
}

/// 支持的区块链枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum SupportedChain {
    Ethereum = 1,
    Base = 8453,
}

impl SupportedChain {
    pub fn from_chain_id(chain_id: u64) -> Option<Self> {
        match chain_id {
            1 => Some(SupportedChain::Ethereum),
            8453 => Some(SupportedChain::Base),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SupportedChain::Ethereum => "Ethereum",
            SupportedChain::Base => "Base",
        }
    }

    pub fn native_token(&self) -> &'static str {
        match self {
            SupportedChain::Ethereum => "ETH",
            SupportedChain::Base => "ETH",
        }
    }

    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            SupportedChain::Ethereum => "https://eth.llamarpc.com",
            SupportedChain::Base => "https://mainnet.base.org",
        }
    }
}

/// 静态 token 表项
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenEntry {
    pub symbol: String,
    pub name: String,
    pub address: String,
    pub decimals: u8,
}

impl TokenEntry {
    fn new(symbol: &str, name: &str, address: &str, decimals: u8) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: name.to_string(),
            address: address.to_string(),
            decimals,
        }
    }
}

/// 链上合约地址配置
#[derive(Debug, Clone, Deserialize)]
pub struct ChainContracts {
    /// Uniswap V3 Quoter / QuoterV2 合约地址
    pub quoter: String,
    pub quoter_version: QuoterVersion,
    /// calldata 的目标 Router 地址
    pub swap_router: String,
    pub router_version: RouterVersion,
    /// Wrapped Native Token 地址 (WETH)
    pub wrapped_native: String,
    /// 内置 token 列表
    pub tokens: Vec<TokenEntry>,
}

impl ChainContracts {
    /// 获取以太坊主网合约地址
    pub fn ethereum() -> Self {
        Self {
            quoter: "0x61fFE014bA17989E743c5F6cB21bF9697530B21e".to_string(), // Uniswap V3 QuoterV2
            quoter_version: QuoterVersion::V2,
            swap_router: "0xE592427A0AEce92De3Edee1F18E0157C05861564".to_string(), // Uniswap V3 Router
            router_version: RouterVersion::V1,
            wrapped_native: "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2".to_string(), // WETH
            tokens: vec![
                TokenEntry::new("WETH", "Wrapped Ether", "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2", 18),
                TokenEntry::new("USDC", "USD Coin", "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48", 6),
                TokenEntry::new("USDT", "Tether USD", "0xdAC17F958D2ee523a2206206994597C13D831ec7", 6),
                TokenEntry::new("DAI", "Dai Stablecoin", "0x6B175474E89094C44Da98b954EedeAC495271d0F", 18),
                TokenEntry::new("WBTC", "Wrapped BTC", "0x2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599", 8),
            ],
        }
    }

    /// 获取 Base 主网合约地址
    pub fn base() -> Self {
        Self {
            quoter: "0x3d4e44Eb1374240CE5F1B871ab261CD16335B76a".to_string(), // Uniswap V3 QuoterV2 on Base
            quoter_version: QuoterVersion::V2,
            swap_router: "0x2626664c2603336E57B271c5C0b26F421741e481".to_string(), // SwapRouter02 on Base
            router_version: RouterVersion::V2,
            wrapped_native: "0x4200000000000000000000000000000000000006".to_string(), // WETH on Base
            tokens: vec![
                TokenEntry::new("WETH", "Wrapped Ether", "0x4200000000000000000000000000000000000006", 18),
                TokenEntry::new("USDC", "USD Coin", "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913", 6),
                TokenEntry::new("USDbC", "USD Base Coin", "0xd9aAEc86B65D86f6A7B5B1b0c42FFA531710b6CA", 6),
                TokenEntry::new("DAI", "Dai Stablecoin", "0x50c5725949A6F0c72E6C4a641F24049A917DB0Cb", 18),
                TokenEntry::new("cbBTC", "Coinbase Wrapped BTC", "0xcbB7C0000aB88B473b1f5aFd9ef808440eed33Bf", 8),
            ],
        }
    }

    /// 根据 chain_id 获取合约地址
    pub fn for_chain(chain_id: u64) -> Option<Self> {
        match chain_id {
            1 => Some(Self::ethereum()),
            8453 => Some(Self::base()),
            _ => None,
        }
    }
}

/// 链配置
#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub name: String,
    pub rpc_url: String,
    /// 原生代币符号 (ETH)
    pub native_token: String,
    /// 链上合约地址
    pub contracts: ChainContracts,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoutingConfig {
    /// 作为中间跳的 token symbol
    pub base_tokens: Vec<String>,
    /// 默认滑点 (50 = 0.50%)
    pub slippage_bps: u32,
    /// 默认截止时间偏移 (秒)
    pub deadline_secs: u64,
    /// 路由搜索重试次数
    pub retries: u32,
    /// 重试间隔 (毫秒)
    pub retry_delay_ms: u64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            base_tokens: vec!["WETH".to_string()],
            slippage_bps: 50,
            deadline_secs: 1200, // 20 分钟
            retries: 3,
            retry_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    /// Uniswap subgraph 地址 (未配置则只用内置 token 表)
    pub subgraph_url: Option<String>,
    /// symbol 别名 (大写 -> 大写)
    pub aliases: HashMap<String, String>,
}

impl ResolverConfig {
    pub fn default_aliases() -> HashMap<String, String> {
        HashMap::from([
            ("ETH".to_string(), "WETH".to_string()),
            ("BTC".to_string(), "BTCB".to_string()),
        ])
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    /// 默认接收地址
    pub address: Option<String>,
    /// 仅 CLI 提交交易时使用
    pub private_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub dir: String,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        // 加载 .env 文件
        dotenv::dotenv().ok();

        Self::from_source(|key| env::var(key).ok())
    }

    /// 从任意 key -> value 来源构建配置
    pub fn from_source<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        // 链配置
        let chain_id: u64 = parse_or(var("CHAIN_ID"), 8453).context("Invalid CHAIN_ID")?;
        let supported = SupportedChain::from_chain_id(chain_id);

        let mut contracts = match ChainContracts::for_chain(chain_id) {
            Some(contracts) => contracts,
            None => {
                // 未内置的链必须显式给出合约地址
                let quoter = var("QUOTER_ADDRESS")
                    .ok_or_else(|| anyhow!("QUOTER_ADDRESS not set for chain {}", chain_id))?;
                let swap_router = var("SWAP_ROUTER_ADDRESS")
                    .ok_or_else(|| anyhow!("SWAP_ROUTER_ADDRESS not set for chain {}", chain_id))?;
                let wrapped_native = var("WRAPPED_NATIVE_ADDRESS")
                    .ok_or_else(|| anyhow!("WRAPPED_NATIVE_ADDRESS not set for chain {}", chain_id))?;
                ChainContracts {
                    quoter,
                    quoter_version: QuoterVersion::V2,
                    swap_router,
                    router_version: RouterVersion::V1,
                    wrapped_native,
                    tokens: Vec::new(),
                }
            }
        };
        if let Some(quoter) = var("QUOTER_ADDRESS") {
            contracts.quoter = quoter;
        }
        if let Some(version) = var("QUOTER_VERSION") {
            contracts.quoter_version = QuoterVersion::from_str(&version)
                .map_err(|e| anyhow!(e))
                .context("Invalid QUOTER_VERSION")?;
        }
        if let Some(router) = var("SWAP_ROUTER_ADDRESS") {
            contracts.swap_router = router;
        }
        if let Some(version) = var("SWAP_ROUTER_VERSION") {
            contracts.router_version = RouterVersion::from_str(&version)
                .map_err(|e| anyhow!(e))
                .context("Invalid SWAP_ROUTER_VERSION")?;
        }

        let chain = ChainConfig {
            chain_id,
            name: supported
                .map(|c| c.name().to_string())
                .unwrap_or_else(|| format!("chain-{}", chain_id)),
            rpc_url: var("RPC_URL")
                .or_else(|| supported.map(|c| c.default_rpc_url().to_string()))
                .ok_or_else(|| anyhow!("RPC_URL not set for chain {}", chain_id))?,
            native_token: var("NATIVE_TOKEN")
                .or_else(|| supported.map(|c| c.native_token().to_string()))
                .unwrap_or_else(|| "ETH".to_string()),
            contracts,
        };

        // 路由配置
        let defaults = RoutingConfig::default();
        let routing = RoutingConfig {
            base_tokens: var("BASE_TOKENS")
                .map(|s| split_list(&s))
                .unwrap_or(defaults.base_tokens),
            slippage_bps: parse_or(var("SLIPPAGE_BPS"), defaults.slippage_bps)
                .context("Invalid SLIPPAGE_BPS")?,
            deadline_secs: parse_or(var("DEADLINE_SECS"), defaults.deadline_secs)
                .context("Invalid DEADLINE_SECS")?,
            retries: parse_or(var("ROUTE_RETRIES"), defaults.retries)
                .context("Invalid ROUTE_RETRIES")?,
            retry_delay_ms: parse_or(var("ROUTE_RETRY_DELAY_MS"), defaults.retry_delay_ms)
                .context("Invalid ROUTE_RETRY_DELAY_MS")?,
        };
        if routing.slippage_bps > 10_000 {
            return Err(anyhow!("SLIPPAGE_BPS must be <= 10000, got {}", routing.slippage_bps));
        }

        // Token 解析配置 (TOKEN_ALIASES 例: "ETH=WETH,BTC=CBBTC")
        let mut aliases = ResolverConfig::default_aliases();
        if let Some(raw) = var("TOKEN_ALIASES") {
            for pair in split_list(&raw) {
                let (from, to) = pair
                    .split_once('=')
                    .ok_or_else(|| anyhow!("Invalid TOKEN_ALIASES entry: {}", pair))?;
                aliases.insert(from.trim().to_uppercase(), to.trim().to_uppercase());
            }
        }
        let resolver = ResolverConfig {
            subgraph_url: var("SUBGRAPH_URL"),
            aliases,
        };

        // 钱包配置
        let wallet = WalletConfig {
            address: var("WALLET_ADDRESS"),
            private_key: var("PRIVATE_KEY"),
        };

        // API 配置
        let api = ApiConfig {
            host: var("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(var("SERVER_PORT"), 9530).context("Invalid SERVER_PORT")?,
        };

        // 日志配置
        let log = LogConfig {
            level: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            dir: var("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
        };

        Ok(Self {
            chain,
            routing,
            resolver,
            wallet,
            api,
            log,
        })
    }
}

fn parse_or<T>(value: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw.parse().map_err(|e| anyhow!("{}: {}", raw, e)),
        None => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
