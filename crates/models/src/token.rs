use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::RoutingError;

/// Token 信息
///
/// 相等性只看 (chain_id, address)，symbol/name 只用于展示
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub address: Address,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub chain_id: u64,
}

impl Token {
    pub fn new(address: Address, symbol: String, name: String, decimals: u8, chain_id: u64) -> Self {
        Self {
            address,
            symbol,
            name,
            decimals,
            chain_id,
        }
    }

    /// 从字符串地址构建 (大小写不敏感)
    pub fn parse(
        address: &str,
        symbol: &str,
        name: &str,
        decimals: u8,
        chain_id: u64,
    ) -> Result<Self, RoutingError> {
        let address = Address::from_str(address.trim()).map_err(|e| {
            RoutingError::Validation(format!("invalid token address {}: {}", address, e))
        })?;
        Ok(Self::new(address, symbol.to_string(), name.to_string(), decimals, chain_id))
    }

    /// 是否同一个链上资产
    pub fn same_asset(&self, other: &Token) -> bool {
        self == other
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.chain_id == other.chain_id && self.address == other.address
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.chain_id.hash(state);
        self.address.hash(state);
    }
}

/// 常用 Token 地址 (Ethereum Mainnet)
pub mod eth_tokens {
    use ethers::types::Address;
    use std::str::FromStr;

    lazy_static::lazy_static! {
        pub static ref WETH: Address = Address::from_str("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2").unwrap();
        pub static ref USDT: Address = Address::from_str("0xdAC17F958D2ee523a2206206994597C13D831ec7").unwrap();
        pub static ref USDC: Address = Address::from_str("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48").unwrap();
        pub static ref DAI: Address = Address::from_str("0x6B175474E89094C44Da98b954EedeAC495271d0F").unwrap();
        pub static ref WBTC: Address = Address::from_str("0x2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599").unwrap();
    }
}

/// 常用 Token 地址 (Base Mainnet)
pub mod base_tokens {
    use ethers::types::Address;
    use std::str::FromStr;

    lazy_static::lazy_static! {
        pub static ref WETH: Address = Address::from_str("0x4200000000000000000000000000000000000006").unwrap();
        pub static ref USDC: Address = Address::from_str("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913").unwrap();
        pub static ref USDBC: Address = Address::from_str("0xd9aAEc86B65D86f6A7B5B1b0c42FFA531710b6CA").unwrap();
        pub static ref DAI: Address = Address::from_str("0x50c5725949A6F0c72E6C4a641F24049A917DB0Cb").unwrap();
        pub static ref CBBTC: Address = Address::from_str("0xcbB7C0000aB88B473b1f5aFd9ef808440eed33Bf").unwrap();
    }
}
