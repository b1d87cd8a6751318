//! 测试用的内存实现

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use dex::QuoteOracle;
use ethers::types::{Address, U256};
use models::{base_tokens, FeeTier, Token};
use services::{StaticTokenResolver, TokenResolver};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const CHAIN_ID: u64 = 8453;

pub fn weth() -> Token {
    Token::new(*base_tokens::WETH, "WETH".into(), "Wrapped Ether".into(), 18, CHAIN_ID)
}

pub fn usdc() -> Token {
    Token::new(*base_tokens::USDC, "USDC".into(), "USD Coin".into(), 6, CHAIN_ID)
}

pub fn dai() -> Token {
    Token::new(*base_tokens::DAI, "DAI".into(), "Dai Stablecoin".into(), 18, CHAIN_ID)
}

pub fn cbbtc() -> Token {
    Token::new(*base_tokens::CBBTC, "cbBTC".into(), "Coinbase Wrapped BTC".into(), 8, CHAIN_ID)
}

/// 按 (in, out, fee) 查表的报价，未配置的组合报 0
pub struct ScriptedOracle {
    quotes: HashMap<(Address, Address, FeeTier), U256>,
    calls: AtomicUsize,
    network_checks: AtomicUsize,
    chain_id: Option<u64>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self {
            quotes: HashMap::new(),
            calls: AtomicUsize::new(0),
            network_checks: AtomicUsize::new(0),
            chain_id: Some(CHAIN_ID),
        }
    }

    pub fn with_quote(mut self, token_in: &Token, token_out: &Token, fee: FeeTier, amount_out: u64) -> Self {
        self.quotes
            .insert((token_in.address, token_out.address, fee), U256::from(amount_out));
        self
    }

    /// None 表示节点不可达
    pub fn on_chain(mut self, chain_id: Option<u64>) -> Self {
        self.chain_id = chain_id;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn network_checks(&self) -> usize {
        self.network_checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteOracle for ScriptedOracle {
    async fn quote(&self, token_in: &Token, token_out: &Token, fee: FeeTier, amount_in: U256) -> U256 {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if amount_in.is_zero() {
            return U256::zero();
        }
        self.quotes
            .get(&(token_in.address, token_out.address, fee))
            .copied()
            .unwrap_or_default()
    }

    async fn check_network(&self) -> Result<u64> {
        self.network_checks.fetch_add(1, Ordering::SeqCst);
        self.chain_id.ok_or_else(|| anyhow!("connection refused"))
    }
}

/// 记录调用次数的静态解析器
pub struct CountingResolver {
    inner: StaticTokenResolver,
    calls: AtomicUsize,
}

impl CountingResolver {
    pub fn new(tokens: Vec<Token>) -> Self {
        let aliases = HashMap::from([("ETH".to_string(), "WETH".to_string())]);
        let inner = tokens
            .into_iter()
            .fold(StaticTokenResolver::new(aliases), |resolver, token| resolver.with_token(token));
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenResolver for CountingResolver {
    async fn resolve(&self, symbol: &str) -> Result<Option<Token>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.resolve(symbol).await
    }
}
