use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use config_crate::TokenEntry;
use models::Token;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// symbol -> Token 解析
#[async_trait]
pub trait TokenResolver: Send + Sync {
    /// 找不到返回 Ok(None)，查询本身失败返回 Err
    async fn resolve(&self, symbol: &str) -> Result<Option<Token>>;
}

#[async_trait]
impl<T: TokenResolver + ?Sized> TokenResolver for Arc<T> {
    async fn resolve(&self, symbol: &str) -> Result<Option<Token>> {
        (**self).resolve(symbol).await
    }
}

/// 大写后套用别名 (ETH -> WETH)
pub fn normalize_symbol(symbol: &str, aliases: &HashMap<String, String>) -> String {
    let upper = symbol.trim().to_uppercase();
    aliases.get(&upper).cloned().unwrap_or(upper)
}

/// 内置 token 表
pub struct StaticTokenResolver {
    /// 大写 symbol -> Token
    tokens: HashMap<String, Token>,
    aliases: HashMap<String, String>,
}

impl StaticTokenResolver {
    pub fn new(aliases: HashMap<String, String>) -> Self {
        Self {
            tokens: HashMap::new(),
            aliases,
        }
    }

    pub fn from_entries(
        chain_id: u64,
        entries: &[TokenEntry],
        aliases: HashMap<String, String>,
    ) -> Result<Self> {
        let mut resolver = Self::new(aliases);
        for entry in entries {
            let token = Token::parse(&entry.address, &entry.symbol, &entry.name, entry.decimals, chain_id)
                .with_context(|| format!("Invalid token entry {}", entry.symbol))?;
            resolver.insert(token);
        }
        Ok(resolver)
    }

    pub fn insert(&mut self, token: Token) {
        self.tokens.insert(token.symbol.to_uppercase(), token);
    }

    pub fn with_token(mut self, token: Token) -> Self {
        self.insert(token);
        self
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl TokenResolver for StaticTokenResolver {
    async fn resolve(&self, symbol: &str) -> Result<Option<Token>> {
        let key = normalize_symbol(symbol, &self.aliases);
        Ok(self.tokens.get(&key).cloned())
    }
}

const TOKEN_QUERY: &str = r#"
query GetToken($symbol: String!) {
  tokens(
    where: { symbol: $symbol }
    orderBy: totalValueLockedUSD
    orderDirection: desc
    first: 1
  ) {
    id
    symbol
    decimals
    name
  }
}"#;

#[derive(Debug, Deserialize)]
struct GraphResponse {
    data: Option<GraphTokens>,
    errors: Option<Vec<GraphError>>,
}

#[derive(Debug, Deserialize)]
struct GraphTokens {
    tokens: Vec<GraphToken>,
}

#[derive(Debug, Deserialize)]
struct GraphToken {
    id: String,
    symbol: String,
    decimals: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct GraphError {
    message: String,
}

/// 解析 subgraph 返回体，取 TVL 最高的一个
pub fn parse_token_response(body: &serde_json::Value, chain_id: u64) -> Result<Option<Token>> {
    let response: GraphResponse =
        serde_json::from_value(body.clone()).context("Invalid subgraph response")?;

    if let Some(errors) = response.errors.filter(|e| !e.is_empty()) {
        let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
        return Err(anyhow!("subgraph error: {}", messages.join("; ")));
    }

    let Some(first) = response.data.and_then(|d| d.tokens.into_iter().next()) else {
        return Ok(None);
    };

    let decimals: u8 = first
        .decimals
        .parse()
        .with_context(|| format!("Invalid decimals {} for {}", first.decimals, first.symbol))?;
    let token = Token::parse(&first.id, &first.symbol, &first.name, decimals, chain_id)?;
    Ok(Some(token))
}

/// Uniswap subgraph 查询
pub struct SubgraphTokenResolver {
    client: reqwest::Client,
    url: String,
    chain_id: u64,
    aliases: HashMap<String, String>,
}

impl SubgraphTokenResolver {
    pub fn new(url: impl Into<String>, chain_id: u64, aliases: HashMap<String, String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            url: url.into(),
            chain_id,
            aliases,
        }
    }
}

#[async_trait]
impl TokenResolver for SubgraphTokenResolver {
    async fn resolve(&self, symbol: &str) -> Result<Option<Token>> {
        let mapped = normalize_symbol(symbol, &self.aliases);
        debug!("subgraph 查询 token: {} (映射为 {})", symbol, mapped);

        let body = serde_json::json!({
            "query": TOKEN_QUERY,
            "variables": { "symbol": mapped },
        });

        let response: serde_json::Value = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .context("subgraph request failed")?
            .error_for_status()
            .context("subgraph returned error status")?
            .json()
            .await
            .context("subgraph response is not json")?;

        let token = parse_token_response(&response, self.chain_id)?;
        match &token {
            Some(t) => info!("subgraph 找到 token {} -> {:?}", mapped, t.address),
            None => debug!("subgraph 没有 token: {}", mapped),
        }
        Ok(token)
    }
}

/// 按顺序尝试多个解析器，第一个命中即返回
pub struct FallbackTokenResolver {
    resolvers: Vec<Arc<dyn TokenResolver>>,
}

impl FallbackTokenResolver {
    pub fn new(resolvers: Vec<Arc<dyn TokenResolver>>) -> Self {
        Self { resolvers }
    }
}

#[async_trait]
impl TokenResolver for FallbackTokenResolver {
    async fn resolve(&self, symbol: &str) -> Result<Option<Token>> {
        let mut last_error = None;

        for resolver in &self.resolvers {
            match resolver.resolve(symbol).await {
                Ok(Some(token)) => return Ok(Some(token)),
                Ok(None) => continue,
                Err(e) => {
                    warn!("token 解析失败 {}: {}", symbol, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::base_tokens;
    use serde_json::json;

    fn aliases() -> HashMap<String, String> {
        config_crate::ResolverConfig::default_aliases()
    }

    fn entries() -> Vec<TokenEntry> {
        vec![
            TokenEntry {
                symbol: "WETH".into(),
                name: "Wrapped Ether".into(),
                address: "0x4200000000000000000000000000000000000006".into(),
                decimals: 18,
            },
            TokenEntry {
                symbol: "USDbC".into(),
                name: "USD Base Coin".into(),
                address: "0xd9aAEc86B65D86f6A7B5B1b0c42FFA531710b6CA".into(),
                decimals: 6,
            },
        ]
    }

    struct Failing;

    #[async_trait]
    impl TokenResolver for Failing {
        async fn resolve(&self, _symbol: &str) -> Result<Option<Token>> {
            Err(anyhow!("index unavailable"))
        }
    }

    #[test]
    fn test_normalize_symbol() {
        let aliases = aliases();
        assert_eq!(normalize_symbol(" eth ", &aliases), "WETH");
        assert_eq!(normalize_symbol("btc", &aliases), "BTCB");
        assert_eq!(normalize_symbol("usdc", &aliases), "USDC");
    }

    #[tokio::test]
    async fn test_static_resolver_is_case_insensitive_and_aliased() {
        let resolver = StaticTokenResolver::from_entries(8453, &entries(), aliases()).unwrap();
        assert_eq!(resolver.len(), 2);

        let eth = resolver.resolve("ETH").await.unwrap().unwrap();
        assert_eq!(eth.address, *base_tokens::WETH);
        assert_eq!(eth.chain_id, 8453);

        let usdbc = resolver.resolve("usdbc").await.unwrap().unwrap();
        assert_eq!(usdbc.decimals, 6);
        assert_eq!(usdbc.symbol, "USDbC");

        assert!(resolver.resolve("FOO").await.unwrap().is_none());
    }

    #[test]
    fn test_bad_entry_fails_construction() {
        let mut bad = entries();
        bad[0].address = "0xnothex".into();
        assert!(StaticTokenResolver::from_entries(8453, &bad, aliases()).is_err());
    }

    #[test]
    fn test_parse_token_response() {
        let body = json!({
            "data": { "tokens": [{
                "id": "0x833589fcd6edb6e08f4c7c32d4f71b54bda02913",
                "symbol": "USDC",
                "decimals": "6",
                "name": "USD Coin"
            }]}
        });
        let token = parse_token_response(&body, 8453).unwrap().unwrap();
        assert_eq!(token.address, *base_tokens::USDC);
        assert_eq!(token.decimals, 6);

        let empty = json!({ "data": { "tokens": [] } });
        assert!(parse_token_response(&empty, 8453).unwrap().is_none());

        let error = json!({ "errors": [{ "message": "indexer down" }] });
        let err = parse_token_response(&error, 8453).unwrap_err();
        assert!(err.to_string().contains("indexer down"));
    }

    #[tokio::test]
    async fn test_fallback_prefers_first_hit() {
        let primary: Arc<dyn TokenResolver> =
            Arc::new(StaticTokenResolver::from_entries(8453, &entries(), aliases()).unwrap());
        let failing: Arc<dyn TokenResolver> = Arc::new(Failing);
        let resolver = FallbackTokenResolver::new(vec![failing, primary]);

        // 第一个报错不影响后面的命中
        let weth = resolver.resolve("weth").await.unwrap().unwrap();
        assert_eq!(weth.address, *base_tokens::WETH);

        // 全部未命中时返回最后的错误
        assert!(resolver.resolve("FOO").await.is_err());

        let empty: Arc<dyn TokenResolver> = Arc::new(StaticTokenResolver::new(aliases()));
        let quiet = FallbackTokenResolver::new(vec![empty]);
        assert!(quiet.resolve("FOO").await.unwrap().is_none());
    }
}
